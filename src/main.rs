mod cli;
mod ui;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use cli::{CandidateCommand, Cli, Command, OrgCommand, WorkflowCommand};
use hireflow::pipeline::{
    AdvanceOutcome, AdvancementProtocol, CandidateId, CandidateProgress, LoadOutcome,
    PipelineEditor, ScoreAggregator, StageKind,
};
use hireflow::service::{HiringClient, HiringService, InMemoryService};
use hireflow::{HireflowConfig, PipelineError, PollOutcome, Poller, Session};
use ui::AdvanceProgress;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => HireflowConfig::load_from(path),
        None => HireflowConfig::load(),
    }
    .context("loading configuration")?;
    debug!(base_url = %config.base_url, signed_in = !config.token.is_empty(), "config loaded");

    let result = match cli.command {
        Command::Workflow(cmd) => workflow(cmd, &connect(&config)?).await,
        Command::Candidate(cmd) => candidate(cmd, &connect(&config)?).await,
        Command::Org(OrgCommand::Wait) => wait_for_profile(connect(&config)?, &config).await,
        Command::Demo => run_demo().await,
    };

    if let Err(err) = result {
        ui::print_error(&err);
        std::process::exit(1);
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "hireflow=debug" } else { "hireflow=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn connect(config: &HireflowConfig) -> anyhow::Result<HiringClient> {
    HiringClient::from_config(config).context("building the service client")
}

async fn workflow<S: HiringService>(cmd: WorkflowCommand, service: S) -> hireflow::Result<()> {
    let editing = !matches!(cmd, WorkflowCommand::Show);
    let mut editor = PipelineEditor::new(service);
    if editor.load().await? == LoadOutcome::Unconfigured {
        ui::print_notice("No workflow configured yet; starting from the default stages.");
    }

    match cmd {
        WorkflowCommand::Show => {}
        WorkflowCommand::Add { stage } => {
            let kind = StageKind::from_label(&stage);
            if !editor.add_stage(kind.clone())? {
                ui::print_notice(&format!("{kind} is already in the pipeline."));
            }
        }
        WorkflowCommand::Remove { stage } => {
            let kind = StageKind::from_label(&stage);
            if !editor.remove_stage(&kind)? {
                ui::print_notice(&format!("{kind} is not in the pipeline."));
            }
        }
        WorkflowCommand::Reorder { stages } => {
            let order: Vec<StageKind> = stages.iter().map(|s| StageKind::from_label(s)).collect();
            editor.reorder_kinds(&order);
        }
    }

    // Show never writes, even when the loaded list is not what is stored.
    if editing && editor.is_dirty() {
        editor.save().await?;
    }
    ui::print_pipeline(editor.stages());
    Ok(())
}

async fn candidate<S: HiringService>(cmd: CandidateCommand, service: S) -> hireflow::Result<()> {
    match cmd {
        CandidateCommand::Status { id } => {
            let protocol = AdvancementProtocol::new(service);
            let snapshot = protocol.snapshot(&CandidateId::from(id)).await?;
            ui::print_snapshot(&snapshot);
        }
        CandidateCommand::Advance { id } => {
            let protocol = AdvancementProtocol::new(service);
            advance_once(&protocol, &CandidateId::from(id)).await?;
        }
        CandidateCommand::Rank { stage, ids } => {
            let stage = StageKind::from_label(&stage);
            let mut ranked = Vec::with_capacity(ids.len());
            for id in ids {
                ranked.push(service.candidate_progress(&CandidateId::from(id)).await?);
            }
            ScoreAggregator::rank_by_stage(&mut ranked, &stage);
            ui::print_ranking(&stage, &ranked);
        }
    }
    Ok(())
}

async fn advance_once<S: HiringService>(
    protocol: &AdvancementProtocol<S>,
    candidate: &CandidateId,
) -> hireflow::Result<AdvanceOutcome> {
    let progress = AdvanceProgress::start(candidate.as_str());
    let result = protocol.advance(candidate).await;
    progress.finish(&result);
    result
}

async fn wait_for_profile(client: HiringClient, config: &HireflowConfig) -> hireflow::Result<()> {
    if !client.session().is_signed_in() {
        return Err(hireflow::service::ServiceError::Unauthenticated.into());
    }
    let spinner = ui::waiting("Waiting for the organization profile");
    let handle = Poller::profile(Arc::new(client), config.poll_policy());

    let outcome = tokio::select! {
        outcome = handle.wait() => outcome,
        _ = tokio::signal::ctrl_c() => PollOutcome::Cancelled,
    };
    spinner.finish_and_clear();

    match outcome {
        PollOutcome::Ready(profile) => ui::print_profile(&profile),
        PollOutcome::Cancelled => ui::print_notice("Stopped waiting."),
        PollOutcome::Exhausted => {
            ui::print_notice("The organization profile is still being prepared.")
        }
        PollOutcome::Failed(err) => return Err(err.into()),
    }
    Ok(())
}

/// Configure a pipeline and walk one candidate through it, all in memory.
async fn run_demo() -> hireflow::Result<()> {
    let service = InMemoryService::new(Session::with_token("demo"))
        .with_latency(Duration::from_millis(300));

    let mut editor = PipelineEditor::new(&service);
    editor.load().await?;
    editor.add_stage(StageKind::TechnicalInterview)?;
    editor.reorder_kinds(&[
        StageKind::InitialInterview,
        StageKind::TechnicalInterview,
        StageKind::Assessment,
    ]);
    if let Err(err) = editor.remove_stage(&StageKind::OfferStage) {
        ui::print_error(&err);
    }
    editor.save().await?;
    ui::print_pipeline(editor.stages());
    println!();

    let id = CandidateId::from("demo-candidate");
    let mut progress = CandidateProgress::new(id.clone()).with_complete(&StageKind::ApplicationScreening);
    progress.set_score(&StageKind::ApplicationScreening, 82.0)?;
    progress.set_score(&StageKind::InitialInterview, 74.5)?;
    progress.set_total_weighted_score(Some(78.3));
    service.insert_candidate(progress);

    let protocol = AdvancementProtocol::new(&service);
    ui::print_snapshot(&protocol.snapshot(&id).await?);
    println!();

    loop {
        if advance_once(&protocol, &id).await? == AdvanceOutcome::Complete {
            break;
        }
    }
    println!();
    ui::print_snapshot(&protocol.snapshot(&id).await?);

    // A second advance while the first is outstanding is refused.
    let replay = CandidateId::from("replay-candidate");
    service.insert_candidate(
        CandidateProgress::new(replay.clone()).with_complete(&StageKind::ApplicationScreening),
    );
    let (first, second) = tokio::join!(protocol.advance(&replay), protocol.advance(&replay));
    first?;
    if let Err(err @ PipelineError::AdvanceInFlight(_)) = second {
        ui::print_error(&err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hireflow::pipeline::WorkflowDefinition;

    fn service() -> InMemoryService {
        InMemoryService::new(Session::with_token("t"))
    }

    #[tokio::test]
    async fn show_on_unconfigured_org_writes_nothing() {
        let svc = service();
        workflow(WorkflowCommand::Show, &svc).await.unwrap();
        assert_eq!(svc.requests(), vec!["get_workflow".to_string()]);
        assert!(svc.workflow().is_none());
    }

    #[tokio::test]
    async fn add_on_unconfigured_org_creates_workflow() {
        let svc = service();
        let cmd = WorkflowCommand::Add {
            stage: "Technical Interview".into(),
        };
        workflow(cmd, &svc).await.unwrap();
        let saved = svc.workflow().unwrap();
        assert_eq!(saved.position(&StageKind::TechnicalInterview), Some(1));
        assert_eq!(saved.len(), 4);
    }

    #[tokio::test]
    async fn partial_reorder_keeps_every_stage() {
        let svc = service().with_workflow(WorkflowDefinition::from_kinds([
            StageKind::ApplicationScreening,
            StageKind::Assessment,
            StageKind::InitialInterview,
            StageKind::FinalInterview,
            StageKind::OfferStage,
        ]));
        let cmd = WorkflowCommand::Reorder {
            stages: vec!["Initial Interview".into()],
        };
        workflow(cmd, &svc).await.unwrap();
        let saved = svc.workflow().unwrap();
        assert_eq!(saved.len(), 5);
        assert_eq!(saved.position(&StageKind::InitialInterview), Some(1));
        assert_eq!(saved.position(&StageKind::Assessment), Some(2));
    }
}
