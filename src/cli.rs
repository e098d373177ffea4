//! Command line interface built on clap.
//!
//! [`Cli`] carries the global flags (`--verbose`, `--config`) and a
//! [`Command`] grouped by what it acts on: the workflow, a candidate, or the
//! organization.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Hireflow: configure hiring pipelines and move candidates through them.
#[derive(Debug, Parser)]
#[command(name = "hireflow", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Config file to read instead of ./hireflow.toml.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Inspect or edit the organization's pipeline.
    #[command(subcommand)]
    Workflow(WorkflowCommand),

    /// Inspect or advance candidates.
    #[command(subcommand)]
    Candidate(CandidateCommand),

    /// Organization-level commands.
    #[command(subcommand)]
    Org(OrgCommand),

    /// Walk a candidate through an in-memory pipeline.
    Demo,
}

#[derive(Debug, Subcommand)]
pub enum WorkflowCommand {
    /// Print the configured stages in order.
    Show,

    /// Add an optional stage just before Final Interview.
    Add {
        /// Stage label, e.g. "Technical Interview" or a custom name.
        stage: String,
    },

    /// Remove an optional stage.
    Remove { stage: String },

    /// Reorder the optional stages. Mandatory stages stay pinned.
    Reorder {
        #[arg(required = true, num_args = 1..)]
        stages: Vec<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum CandidateCommand {
    /// Show the current stage, next stage and scores.
    Status { id: String },

    /// Move the candidate to the next stage.
    Advance { id: String },

    /// Rank candidates by their score on one stage.
    Rank {
        #[arg(long)]
        stage: String,

        #[arg(required = true, num_args = 1..)]
        ids: Vec<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum OrgCommand {
    /// Wait until the organization profile is populated.
    Wait,
}
