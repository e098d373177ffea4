use tracing::info;

use super::catalog::StageKind;
use super::progress::{
    AssignmentSubmission, CandidateId, Feedback, InterviewSchedule, OfferTerms, StagePayload,
};
use crate::error::{PipelineError, Result};
use crate::service::HiringService;

/// Records stage-specific data (schedules, feedback, submissions, offers).
///
/// None of these move the candidate. Payloads sent to a stage they do not
/// belong to are refused before the service is contacted.
pub struct StageRecorder<S> {
    service: S,
}

impl<S: HiringService> StageRecorder<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }

    pub async fn record(
        &self,
        candidate: &CandidateId,
        stage: &StageKind,
        payload: StagePayload,
    ) -> Result<()> {
        payload.check_stage(stage)?;
        self.service
            .record_stage_detail(candidate, stage, &payload)
            .await?;
        info!(%candidate, %stage, kind = payload.kind(), "stage detail recorded");
        Ok(())
    }

    pub async fn schedule_interview(
        &self,
        candidate: &CandidateId,
        stage: &StageKind,
        schedule: InterviewSchedule,
    ) -> Result<()> {
        if schedule.duration_minutes == 0 {
            return Err(PipelineError::Invariant(
                "an interview needs a non-zero duration".into(),
            ));
        }
        self.record(candidate, stage, StagePayload::Schedule(schedule))
            .await
    }

    pub async fn record_feedback(
        &self,
        candidate: &CandidateId,
        stage: &StageKind,
        feedback: Feedback,
    ) -> Result<()> {
        if feedback.text.trim().is_empty() {
            return Err(PipelineError::Invariant("feedback must not be empty".into()));
        }
        self.record(candidate, stage, StagePayload::Feedback(feedback))
            .await
    }

    pub async fn record_submission(
        &self,
        candidate: &CandidateId,
        submission: AssignmentSubmission,
    ) -> Result<()> {
        self.record(
            candidate,
            &StageKind::Assessment,
            StagePayload::Submission(submission),
        )
        .await
    }

    pub async fn make_offer(&self, candidate: &CandidateId, terms: OfferTerms) -> Result<()> {
        if terms.salary <= 0.0 {
            return Err(PipelineError::Invariant("offer salary must be positive".into()));
        }
        self.record(candidate, &StageKind::OfferStage, StagePayload::Offer(terms))
            .await
    }
}
