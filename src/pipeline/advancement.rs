use std::collections::HashSet;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{Instrument, debug, info, info_span, warn};

use super::catalog::StageKind;
use super::progress::CandidateId;
use super::resolver::StageResolver;
use super::scores::{ScoreAggregator, StageReport};
use crate::error::{PipelineError, Result};
use crate::service::{AdvanceResponse, HiringService, ServiceError};

/// What an advance did, as reported by the hiring service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// The candidate is now at this stage.
    Moved(StageKind),
    /// The last stage was finished; there is nothing further.
    Complete,
}

impl AdvanceOutcome {
    fn from_response(resp: AdvanceResponse) -> Result<Self, ServiceError> {
        if resp.completed {
            return Ok(AdvanceOutcome::Complete);
        }
        resp.current_step.map(AdvanceOutcome::Moved).ok_or_else(|| {
            ServiceError::Malformed("advance response has neither a stage nor completion".into())
        })
    }
}

/// Derived view of one candidate, for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateSnapshot {
    pub candidate_id: CandidateId,
    pub current: Option<StageKind>,
    pub next: Option<StageKind>,
    pub complete: bool,
    pub total_score: Option<f64>,
    pub completion_percent: f64,
    pub stages: Vec<StageReport>,
}

/// Moves candidates to their next stage, one request per candidate at a time.
///
/// Advancing is not idempotent on the service, so a second advance for a
/// candidate whose first one has not returned is refused with
/// [`PipelineError::AdvanceInFlight`]. Different candidates never block
/// each other.
pub struct AdvancementProtocol<S> {
    service: S,
    in_flight: Mutex<HashSet<CandidateId>>,
}

/// Holds a candidate's in-flight slot until dropped.
struct FlightSlot<'a> {
    set: &'a Mutex<HashSet<CandidateId>>,
    candidate: CandidateId,
}

impl Drop for FlightSlot<'_> {
    fn drop(&mut self) {
        self.set.lock().remove(&self.candidate);
    }
}

impl<S: HiringService> AdvancementProtocol<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Whether an advance for this candidate is awaiting its response. The
    /// presentation layer keeps the advance control disabled while it is.
    pub fn is_in_flight(&self, candidate: &CandidateId) -> bool {
        self.in_flight.lock().contains(candidate)
    }

    fn claim(&self, candidate: &CandidateId) -> Result<FlightSlot<'_>> {
        let mut set = self.in_flight.lock();
        if !set.insert(candidate.clone()) {
            return Err(PipelineError::AdvanceInFlight(candidate.clone()));
        }
        Ok(FlightSlot {
            set: &self.in_flight,
            candidate: candidate.clone(),
        })
    }

    /// The stage an advance would move the candidate to, or `None` when the
    /// candidate is already through the last stage.
    pub async fn peek_next_stage(&self, candidate: &CandidateId) -> Result<Option<StageKind>> {
        let next = self.service.next_step(candidate).await?;
        debug!(%candidate, next = ?next, "peeked next stage");
        Ok(next)
    }

    /// Ask the service to move the candidate one stage forward.
    pub async fn advance(&self, candidate: &CandidateId) -> Result<AdvanceOutcome> {
        let span = info_span!("advance", %candidate);
        async {
            let _slot = self.claim(candidate).inspect_err(|_| {
                warn!("advance already in flight, refusing duplicate");
            })?;

            let resp = self.service.advance_candidate(candidate).await.map_err(|err| {
                let err = PipelineError::from(err);
                warn!(class = %err.class(), error = %err, "advance failed");
                err
            })?;

            let outcome = AdvanceOutcome::from_response(resp)?;
            match &outcome {
                AdvanceOutcome::Moved(stage) => info!(%stage, "candidate advanced"),
                AdvanceOutcome::Complete => info!("hiring process complete"),
            }
            Ok::<_, PipelineError>(outcome)
        }
        .instrument(span)
        .await
    }

    /// Fetch the workflow and the candidate's progress and derive the
    /// current view. A point-in-time read; re-query after an advance.
    pub async fn snapshot(&self, candidate: &CandidateId) -> Result<CandidateSnapshot> {
        let definition = self.service.get_workflow().await?;
        let progress = self.service.candidate_progress(candidate).await?;
        Ok(CandidateSnapshot {
            candidate_id: candidate.clone(),
            current: StageResolver::current_stage(&definition, &progress),
            next: StageResolver::next_stage(&definition, &progress),
            complete: StageResolver::is_complete(&definition, &progress),
            total_score: ScoreAggregator::total_score(&progress),
            completion_percent: ScoreAggregator::completion_percent(&definition, &progress),
            stages: ScoreAggregator::stage_breakdown(&definition, &progress),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::error::ErrorClass;
    use crate::pipeline::{CandidateProgress, WorkflowDefinition};
    use crate::service::InMemoryService;
    use crate::session::Session;

    fn definition() -> WorkflowDefinition {
        WorkflowDefinition::from_kinds([
            StageKind::ApplicationScreening,
            StageKind::Assessment,
            StageKind::InitialInterview,
            StageKind::FinalInterview,
            StageKind::OfferStage,
        ])
    }

    fn service(done: &[StageKind]) -> InMemoryService {
        let progress = done
            .iter()
            .fold(CandidateProgress::new("c-1"), |p, s| p.with_complete(s));
        InMemoryService::new(Session::with_token("t"))
            .with_workflow(definition())
            .with_candidate(progress)
    }

    fn id() -> CandidateId {
        CandidateId::from("c-1")
    }

    #[tokio::test]
    async fn screening_done_peeks_assessment() {
        let svc = service(&[StageKind::ApplicationScreening]);
        let protocol = AdvancementProtocol::new(&svc);

        let snap = protocol.snapshot(&id()).await.unwrap();
        assert_eq!(snap.current, Some(StageKind::ApplicationScreening));
        assert_eq!(
            protocol.peek_next_stage(&id()).await.unwrap(),
            Some(StageKind::Assessment)
        );
    }

    #[tokio::test]
    async fn final_interview_advances_to_offer() {
        let svc = service(&[
            StageKind::ApplicationScreening,
            StageKind::Assessment,
            StageKind::InitialInterview,
            StageKind::FinalInterview,
        ]);
        let protocol = AdvancementProtocol::new(&svc);

        let snap = protocol.snapshot(&id()).await.unwrap();
        assert_eq!(snap.current, Some(StageKind::FinalInterview));
        assert_eq!(snap.completion_percent, 80.0);

        assert_eq!(
            protocol.advance(&id()).await.unwrap(),
            AdvanceOutcome::Moved(StageKind::OfferStage)
        );
        let snap = protocol.snapshot(&id()).await.unwrap();
        assert_eq!(snap.current, Some(StageKind::OfferStage));
        assert!(snap.complete);
        assert_eq!(snap.next, None);
    }

    #[tokio::test]
    async fn last_stage_reports_complete() {
        let svc = service(&[StageKind::OfferStage]);
        let protocol = AdvancementProtocol::new(&svc);
        assert_eq!(protocol.peek_next_stage(&id()).await.unwrap(), None);
        assert_eq!(
            protocol.advance(&id()).await.unwrap(),
            AdvanceOutcome::Complete
        );
    }

    #[tokio::test]
    async fn concurrent_advance_for_same_candidate_is_refused() {
        let svc = service(&[StageKind::ApplicationScreening])
            .with_latency(Duration::from_millis(20));
        let protocol = AdvancementProtocol::new(&svc);

        let cid = id();
        let (first, second) = tokio::join!(protocol.advance(&cid), protocol.advance(&cid));
        assert_eq!(first.unwrap(), AdvanceOutcome::Moved(StageKind::Assessment));
        assert!(matches!(second, Err(PipelineError::AdvanceInFlight(_))));

        // Moved one stage, not two.
        let progress = svc.progress(&id()).unwrap();
        assert!(progress.is_complete(&StageKind::Assessment));
        assert!(!progress.is_complete(&StageKind::InitialInterview));
        assert!(!protocol.is_in_flight(&id()));

        // Once the first settles the next advance goes through.
        assert_eq!(
            protocol.advance(&id()).await.unwrap(),
            AdvanceOutcome::Moved(StageKind::InitialInterview)
        );
    }

    #[tokio::test]
    async fn different_candidates_advance_independently() {
        let svc = service(&[StageKind::ApplicationScreening])
            .with_latency(Duration::from_millis(10))
            .with_candidate(CandidateProgress::new("c-2").with_complete(&StageKind::Assessment));
        let protocol = AdvancementProtocol::new(&svc);

        let cid = id();
        let other = CandidateId::from("c-2");
        let (a, b) = tokio::join!(protocol.advance(&cid), protocol.advance(&other));
        assert_eq!(a.unwrap(), AdvanceOutcome::Moved(StageKind::Assessment));
        assert_eq!(b.unwrap(), AdvanceOutcome::Moved(StageKind::InitialInterview));
    }

    #[tokio::test]
    async fn failure_releases_the_slot() {
        let svc = service(&[StageKind::ApplicationScreening]);
        let protocol = AdvancementProtocol::new(&svc);

        svc.set_unavailable(true);
        let err = protocol.advance(&id()).await.unwrap_err();
        assert_eq!(err.class(), ErrorClass::Transient);
        assert!(!protocol.is_in_flight(&id()));

        svc.set_unavailable(false);
        assert!(protocol.advance(&id()).await.is_ok());
    }

    #[tokio::test]
    async fn auth_failures_are_distinct() {
        let svc = service(&[StageKind::ApplicationScreening]);
        svc.expire_session();
        let protocol = AdvancementProtocol::new(&svc);
        let err = protocol.advance(&id()).await.unwrap_err();
        assert_eq!(err.class(), ErrorClass::Unauthorized);
        assert!(err.needs_sign_in());

        let anon = InMemoryService::new(Session::anonymous()).with_workflow(definition());
        let protocol = AdvancementProtocol::new(&anon);
        let err = protocol.advance(&id()).await.unwrap_err();
        assert_eq!(err.class(), ErrorClass::Unauthenticated);
        assert!(anon.requests().is_empty());
    }

    #[tokio::test]
    async fn unknown_candidate_is_not_found() {
        let svc = service(&[]);
        let protocol = AdvancementProtocol::new(&svc);
        let err = protocol
            .advance(&CandidateId::from("nobody"))
            .await
            .unwrap_err();
        assert_eq!(err.class(), ErrorClass::NotFound);
        assert!(!err.is_retryable());
    }

    #[test]
    fn malformed_response_is_rejected() {
        let resp = AdvanceResponse {
            current_step: None,
            completed: false,
        };
        assert!(matches!(
            AdvanceOutcome::from_response(resp),
            Err(ServiceError::Malformed(_))
        ));
    }
}
