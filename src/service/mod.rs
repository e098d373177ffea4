pub mod client;
pub mod error;
pub mod memory;
pub mod types;

pub use client::HiringClient;
pub use error::ServiceError;
pub use memory::InMemoryService;
pub use types::{AdvanceResponse, NextStepResponse, OrgProfile, SaveOutcome};

use crate::pipeline::{CandidateId, CandidateProgress, StageKind, StagePayload, WorkflowDefinition};

/// The remote hiring-data service. It owns candidates, jobs and workflow
/// definitions and persists every mutation; the engine only asks.
#[allow(async_fn_in_trait)]
pub trait HiringService {
    async fn get_workflow(&self) -> Result<WorkflowDefinition, ServiceError>;

    /// Replace the organization's whole workflow.
    async fn save_workflow(
        &self,
        definition: &WorkflowDefinition,
    ) -> Result<SaveOutcome, ServiceError>;

    /// `None` when the candidate has no further stage.
    async fn next_step(&self, candidate: &CandidateId) -> Result<Option<StageKind>, ServiceError>;

    /// Perform one transition. Not idempotent: every call advances.
    async fn advance_candidate(
        &self,
        candidate: &CandidateId,
    ) -> Result<AdvanceResponse, ServiceError>;

    async fn candidate_progress(
        &self,
        candidate: &CandidateId,
    ) -> Result<CandidateProgress, ServiceError>;

    /// Record auxiliary data on a stage without changing the active stage.
    async fn record_stage_detail(
        &self,
        candidate: &CandidateId,
        stage: &StageKind,
        payload: &StagePayload,
    ) -> Result<(), ServiceError>;

    async fn org_profile(&self) -> Result<OrgProfile, ServiceError>;
}

impl<T: HiringService> HiringService for &T {
    async fn get_workflow(&self) -> Result<WorkflowDefinition, ServiceError> {
        (**self).get_workflow().await
    }

    async fn save_workflow(
        &self,
        definition: &WorkflowDefinition,
    ) -> Result<SaveOutcome, ServiceError> {
        (**self).save_workflow(definition).await
    }

    async fn next_step(&self, candidate: &CandidateId) -> Result<Option<StageKind>, ServiceError> {
        (**self).next_step(candidate).await
    }

    async fn advance_candidate(
        &self,
        candidate: &CandidateId,
    ) -> Result<AdvanceResponse, ServiceError> {
        (**self).advance_candidate(candidate).await
    }

    async fn candidate_progress(
        &self,
        candidate: &CandidateId,
    ) -> Result<CandidateProgress, ServiceError> {
        (**self).candidate_progress(candidate).await
    }

    async fn record_stage_detail(
        &self,
        candidate: &CandidateId,
        stage: &StageKind,
        payload: &StagePayload,
    ) -> Result<(), ServiceError> {
        (**self).record_stage_detail(candidate, stage, payload).await
    }

    async fn org_profile(&self) -> Result<OrgProfile, ServiceError> {
        (**self).org_profile().await
    }
}
