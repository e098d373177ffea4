//! Hiring-pipeline workflow engine.
//!
//! An organization configures an ordered list of hiring stages
//! ([`pipeline::WorkflowDefinition`]), edited through
//! [`pipeline::PipelineEditor`] under a pinning rule: Application Screening
//! first, Final Interview and Offer Stage last. Candidates move through the
//! stages one at a time via [`pipeline::AdvancementProtocol`]; the hiring
//! service behind [`service::HiringService`] persists everything.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod poller;
pub mod service;
pub mod session;

pub use config::HireflowConfig;
pub use error::{ErrorClass, PipelineError, Result};
pub use poller::{PollHandle, PollOutcome, PollPolicy, Poller};
pub use session::Session;
