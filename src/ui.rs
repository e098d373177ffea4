//! Terminal output: spinners and colored text.
//!
//! `indicatif` drives the spinner shown while an advance is in flight and
//! `console` styles everything else.

use std::time::Duration;

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use hireflow::pipeline::{
    AdvanceOutcome, CandidateProgress, CandidateSnapshot, Stage, StageKind, StageReport,
};
use hireflow::PipelineError;
use hireflow::service::OrgProfile;

/// Spinner shown while one advance request is outstanding.
///
/// Green for a move, red for a failure. While it spins the caller must not
/// start another advance for the same candidate.
pub struct AdvanceProgress {
    pb: ProgressBar,
    green: Style,
    red: Style,
}

impl AdvanceProgress {
    pub fn start(candidate: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        pb.set_style(style);
        pb.set_message(format!("Advancing {candidate}"));
        pb.enable_steady_tick(Duration::from_millis(100));

        Self {
            pb,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
        }
    }

    pub fn finish(&self, result: &Result<AdvanceOutcome, PipelineError>) {
        self.pb.finish_and_clear();
        match result {
            Ok(AdvanceOutcome::Moved(stage)) => {
                println!("  {} Moved to {stage}", self.green.apply_to("✓"));
            }
            Ok(AdvanceOutcome::Complete) => {
                println!(
                    "  {} Hiring process complete",
                    self.green.apply_to("✓")
                );
            }
            Err(err) => {
                println!("  {} {}", self.red.apply_to("✗"), err.user_message());
            }
        }
    }
}

/// Spinner for the organization profile wait.
pub fn waiting(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .template("{spinner:.yellow} {msg} ({elapsed})")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

pub fn print_pipeline(stages: &[Stage]) {
    let pinned = Style::new().cyan();
    let dim = Style::new().dim();
    println!("{}", Style::new().bold().apply_to("─── Pipeline ───"));
    for (i, stage) in stages.iter().enumerate() {
        let marker = if stage.mandatory { "■" } else { "□" };
        println!(
            "  {:>2}. {} {}",
            i + 1,
            pinned.apply_to(marker),
            stage.name()
        );
        println!("        {}", dim.apply_to(&stage.description));
    }
}

pub fn print_snapshot(snapshot: &CandidateSnapshot) {
    let bold = Style::new().bold();
    let label = |stage: &Option<StageKind>| {
        stage
            .as_ref()
            .map(|s| s.label().to_string())
            .unwrap_or_else(|| "-".into())
    };

    println!(
        "{}",
        bold.apply_to(format!("─── Candidate {} ───", snapshot.candidate_id))
    );
    println!("  Current stage: {}", label(&snapshot.current));
    println!("  Next stage:    {}", label(&snapshot.next));
    println!("  Progress:      {:.0}%", snapshot.completion_percent);
    match snapshot.total_score {
        Some(total) => println!("  Total score:   {total:.1}"),
        None => println!("  Total score:   -"),
    }
    if snapshot.complete {
        println!("  {}", Style::new().green().apply_to("Hiring process complete"));
    }
    println!();
    for report in &snapshot.stages {
        print_stage_row(report);
    }
}

fn print_stage_row(report: &StageReport) {
    let (mark, style) = if report.completed {
        ("✓", Style::new().green())
    } else {
        ("·", Style::new().dim())
    };
    let score = report
        .score
        .map(|s| format!("{s:>5.1}"))
        .unwrap_or_else(|| "    -".into());
    println!(
        "  {} {:<28} {score}",
        style.apply_to(mark),
        report.stage.label()
    );
}

pub fn print_ranking(stage: &StageKind, ranked: &[CandidateProgress]) {
    println!(
        "{}",
        Style::new()
            .bold()
            .apply_to(format!("─── Ranking by {stage} ───"))
    );
    for (i, progress) in ranked.iter().enumerate() {
        let score = progress
            .score(stage)
            .map(|s| format!("{s:.1}"))
            .unwrap_or_else(|| "unscored".into());
        println!("  {:>2}. {:<20} {score}", i + 1, progress.candidate_id.as_str());
    }
}

pub fn print_profile(profile: &OrgProfile) {
    println!(
        "  {} {} ({}) is ready",
        Style::new().green().bold().apply_to("✓"),
        profile.name,
        profile.organization_id
    );
}

pub fn print_notice(message: &str) {
    println!("  {} {message}", Style::new().yellow().apply_to("!"));
}

/// Classed error output. Auth failures also tell the user how to sign in.
pub fn print_error(err: &PipelineError) {
    let red = Style::new().red().bold();
    eprintln!("  {} {}", red.apply_to("✗"), err.user_message());
    if err.needs_sign_in() {
        eprintln!(
            "    {}",
            Style::new()
                .dim()
                .apply_to("Set HIREFLOW_TOKEN or `token` in hireflow.toml.")
        );
    }
}
