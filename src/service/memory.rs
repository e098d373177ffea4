//! In-process hiring service with the same transition rules as the remote one.
//!
//! Backs the `demo` command and the engine's tests. State sits behind a
//! mutex that is never held across an await point.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;

use super::HiringService;
use super::error::ServiceError;
use super::types::{AdvanceResponse, OrgProfile, SaveOutcome};
use crate::pipeline::{
    CandidateId, CandidateProgress, StageKind, StagePayload, StageResolver, WorkflowDefinition,
};
use crate::session::Session;

#[derive(Debug, Default)]
struct MemoryState {
    workflow: Option<WorkflowDefinition>,
    candidates: HashMap<CandidateId, CandidateProgress>,
    profile_polls: u32,
    session_expired: bool,
    unavailable: bool,
    requests: Vec<String>,
}

#[derive(Debug)]
pub struct InMemoryService {
    session: Session,
    latency: Option<Duration>,
    profile_ready_after: u32,
    state: Mutex<MemoryState>,
}

impl InMemoryService {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            latency: None,
            profile_ready_after: 1,
            state: Mutex::new(MemoryState::default()),
        }
    }

    /// Delay every call, so concurrent requests overlap.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// The organization profile reports `populated` from the n-th poll onwards.
    pub fn with_profile_ready_after(mut self, polls: u32) -> Self {
        self.profile_ready_after = polls;
        self
    }

    pub fn with_workflow(self, workflow: WorkflowDefinition) -> Self {
        self.state.lock().workflow = Some(workflow);
        self
    }

    pub fn with_candidate(self, progress: CandidateProgress) -> Self {
        self.insert_candidate(progress);
        self
    }

    pub fn insert_candidate(&self, progress: CandidateProgress) {
        self.state
            .lock()
            .candidates
            .insert(progress.candidate_id.clone(), progress);
    }

    pub fn workflow(&self) -> Option<WorkflowDefinition> {
        self.state.lock().workflow.clone()
    }

    pub fn progress(&self, candidate: &CandidateId) -> Option<CandidateProgress> {
        self.state.lock().candidates.get(candidate).cloned()
    }

    /// Make the service reject the credential from now on.
    pub fn expire_session(&self) {
        self.state.lock().session_expired = true;
    }

    /// Toggle a simulated outage.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().unavailable = unavailable;
    }

    /// Requests that reached the service, oldest first.
    pub fn requests(&self) -> Vec<String> {
        self.state.lock().requests.clone()
    }

    async fn enter(&self, request: String) -> Result<(), ServiceError> {
        self.session.bearer()?;
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let mut state = self.state.lock();
        if state.session_expired {
            return Err(ServiceError::Unauthorized {
                status: 401,
                message: "session expired".into(),
            });
        }
        if state.unavailable {
            return Err(ServiceError::Transient {
                status: 503,
                message: "service unavailable".into(),
            });
        }
        state.requests.push(request);
        Ok(())
    }
}

fn workflow_of(workflow: &Option<WorkflowDefinition>) -> Result<&WorkflowDefinition, ServiceError> {
    workflow.as_ref().ok_or_else(|| ServiceError::NotFound {
        message: "workflow not configured".into(),
    })
}

fn candidate_not_found(candidate: &CandidateId) -> ServiceError {
    ServiceError::NotFound {
        message: format!("candidate {candidate}"),
    }
}

impl HiringService for InMemoryService {
    async fn get_workflow(&self) -> Result<WorkflowDefinition, ServiceError> {
        self.enter("get_workflow".into()).await?;
        workflow_of(&self.state.lock().workflow).cloned()
    }

    async fn save_workflow(
        &self,
        definition: &WorkflowDefinition,
    ) -> Result<SaveOutcome, ServiceError> {
        self.enter("save_workflow".into()).await?;
        let mut state = self.state.lock();
        let outcome = if state.workflow.is_some() {
            SaveOutcome::Updated
        } else {
            SaveOutcome::Created
        };
        state.workflow = Some(definition.clone());
        Ok(outcome)
    }

    async fn next_step(&self, candidate: &CandidateId) -> Result<Option<StageKind>, ServiceError> {
        self.enter(format!("next_step {candidate}")).await?;
        let state = self.state.lock();
        let workflow = workflow_of(&state.workflow)?;
        let progress = state
            .candidates
            .get(candidate)
            .ok_or_else(|| candidate_not_found(candidate))?;
        Ok(StageResolver::next_stage(workflow, progress))
    }

    async fn advance_candidate(
        &self,
        candidate: &CandidateId,
    ) -> Result<AdvanceResponse, ServiceError> {
        self.enter(format!("advance {candidate}")).await?;
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let workflow = workflow_of(&state.workflow)?;
        let progress = state
            .candidates
            .get_mut(candidate)
            .ok_or_else(|| candidate_not_found(candidate))?;

        match StageResolver::next_stage(workflow, progress) {
            Some(next) => {
                progress.set_complete(&next, true);
                Ok(AdvanceResponse::moved_to(next))
            }
            None => Ok(AdvanceResponse::complete()),
        }
    }

    async fn candidate_progress(
        &self,
        candidate: &CandidateId,
    ) -> Result<CandidateProgress, ServiceError> {
        self.enter(format!("progress {candidate}")).await?;
        self.state
            .lock()
            .candidates
            .get(candidate)
            .cloned()
            .ok_or_else(|| candidate_not_found(candidate))
    }

    async fn record_stage_detail(
        &self,
        candidate: &CandidateId,
        stage: &StageKind,
        payload: &StagePayload,
    ) -> Result<(), ServiceError> {
        self.enter(format!("record {} {candidate} {stage}", payload.kind()))
            .await?;
        let mut state = self.state.lock();
        let progress = state
            .candidates
            .get_mut(candidate)
            .ok_or_else(|| candidate_not_found(candidate))?;
        progress
            .attach(stage, payload.clone())
            .map_err(|e| ServiceError::Rejected {
                status: 422,
                message: e.to_string(),
            })
    }

    async fn org_profile(&self) -> Result<OrgProfile, ServiceError> {
        self.enter("org_profile".into()).await?;
        let mut state = self.state.lock();
        state.profile_polls += 1;
        Ok(OrgProfile {
            organization_id: "org-demo".into(),
            name: "Demo Organization".into(),
            populated: state.profile_polls >= self.profile_ready_after,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> InMemoryService {
        InMemoryService::new(Session::with_token("t"))
            .with_workflow(WorkflowDefinition::from_kinds([
                StageKind::ApplicationScreening,
                StageKind::Assessment,
                StageKind::FinalInterview,
                StageKind::OfferStage,
            ]))
            .with_candidate(
                CandidateProgress::new("c-1").with_complete(&StageKind::ApplicationScreening),
            )
    }

    #[tokio::test]
    async fn advance_marks_next_stage() {
        let svc = service();
        let id = CandidateId::from("c-1");
        let resp = svc.advance_candidate(&id).await.unwrap();
        assert_eq!(resp, AdvanceResponse::moved_to(StageKind::Assessment));
        assert!(svc.progress(&id).unwrap().is_complete(&StageKind::Assessment));
    }

    #[tokio::test]
    async fn advance_past_last_stage_completes() {
        let svc = service();
        let id = CandidateId::from("c-1");
        for expected in [StageKind::Assessment, StageKind::FinalInterview, StageKind::OfferStage] {
            assert_eq!(
                svc.advance_candidate(&id).await.unwrap(),
                AdvanceResponse::moved_to(expected)
            );
        }
        assert_eq!(svc.next_step(&id).await.unwrap(), None);
        assert_eq!(
            svc.advance_candidate(&id).await.unwrap(),
            AdvanceResponse::complete()
        );
    }

    #[tokio::test]
    async fn save_reports_created_then_updated() {
        let svc = InMemoryService::new(Session::with_token("t"));
        let def = WorkflowDefinition::from_kinds(crate::pipeline::StageCatalog::mandatory());
        assert!(matches!(
            svc.get_workflow().await,
            Err(ServiceError::NotFound { .. })
        ));
        assert_eq!(svc.save_workflow(&def).await.unwrap(), SaveOutcome::Created);
        assert_eq!(svc.save_workflow(&def).await.unwrap(), SaveOutcome::Updated);
        assert_eq!(svc.get_workflow().await.unwrap(), def);
    }

    #[tokio::test]
    async fn anonymous_and_expired_sessions() {
        let svc = InMemoryService::new(Session::anonymous());
        assert!(matches!(
            svc.org_profile().await,
            Err(ServiceError::Unauthenticated)
        ));
        assert!(svc.requests().is_empty());

        let svc = service();
        svc.expire_session();
        assert!(matches!(
            svc.advance_candidate(&CandidateId::from("c-1")).await,
            Err(ServiceError::Unauthorized { status: 401, .. })
        ));
    }

    #[tokio::test]
    async fn profile_populates_after_configured_polls() {
        let svc = InMemoryService::new(Session::with_token("t")).with_profile_ready_after(3);
        assert!(!svc.org_profile().await.unwrap().populated);
        assert!(!svc.org_profile().await.unwrap().populated);
        assert!(svc.org_profile().await.unwrap().populated);
    }

    #[tokio::test]
    async fn unknown_candidate_is_not_found() {
        let svc = service();
        assert!(matches!(
            svc.candidate_progress(&CandidateId::from("nobody")).await,
            Err(ServiceError::NotFound { .. })
        ));
    }
}
