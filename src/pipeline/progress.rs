use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::catalog::StageKind;
use crate::error::{PipelineError, Result};

/// Identifier of a candidate's application, as issued by the hiring service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateId(String);

impl CandidateId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CandidateId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for CandidateId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewSchedule {
    pub starts_at: DateTime<Utc>,
    #[serde(default = "default_duration_minutes")]
    pub duration_minutes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interviewer: Option<String>,
}

fn default_duration_minutes() -> u32 {
    60
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentSubmission {
    pub url: String,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferTerms {
    pub salary: f64,
    pub currency: String,
    pub start_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Auxiliary data attached to one stage of a candidate's progress.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<InterviewSchedule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<Feedback>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submission: Option<AssignmentSubmission>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offer: Option<OfferTerms>,
}

/// A payload that can be recorded against a stage without moving the candidate.
#[derive(Debug, Clone, PartialEq)]
pub enum StagePayload {
    Schedule(InterviewSchedule),
    Feedback(Feedback),
    Submission(AssignmentSubmission),
    Offer(OfferTerms),
}

impl StagePayload {
    /// Short name, also the last path segment of the recording endpoint.
    pub fn kind(&self) -> &'static str {
        match self {
            StagePayload::Schedule(_) => "schedule",
            StagePayload::Feedback(_) => "feedback",
            StagePayload::Submission(_) => "submission",
            StagePayload::Offer(_) => "offer",
        }
    }

    /// Reject payloads attached to a stage they do not belong to.
    pub fn check_stage(&self, stage: &StageKind) -> Result<()> {
        let fits = match self {
            StagePayload::Schedule(_) => stage.is_interview(),
            StagePayload::Feedback(_) => true,
            StagePayload::Submission(_) => *stage == StageKind::Assessment,
            StagePayload::Offer(_) => *stage == StageKind::OfferStage,
        };
        if fits {
            Ok(())
        } else {
            Err(PipelineError::Invariant(format!(
                "a {} cannot be recorded for the {stage} stage",
                self.kind()
            )))
        }
    }
}

/// One candidate's progress through one job's pipeline.
///
/// Flags, scores and details are keyed by [`StageKind::flag_key`], so a stage
/// that is renamed or removed from the workflow leaves its old entries orphaned
/// rather than rewritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateProgress {
    pub candidate_id: CandidateId,
    #[serde(default)]
    flags: HashMap<String, bool>,
    #[serde(default)]
    scores: HashMap<String, f64>,
    #[serde(default)]
    details: HashMap<String, StageDetails>,
    #[serde(default)]
    total_weighted_score: Option<f64>,
}

impl CandidateProgress {
    pub fn new(candidate_id: impl Into<CandidateId>) -> Self {
        Self {
            candidate_id: candidate_id.into(),
            flags: HashMap::new(),
            scores: HashMap::new(),
            details: HashMap::new(),
            total_weighted_score: None,
        }
    }

    /// Completion flag for a stage. Unknown stages are not complete.
    pub fn is_complete(&self, stage: &StageKind) -> bool {
        self.flags.get(&stage.flag_key()).copied().unwrap_or(false)
    }

    pub fn set_complete(&mut self, stage: &StageKind, complete: bool) {
        self.flags.insert(stage.flag_key(), complete);
    }

    /// Builder form of [`CandidateProgress::set_complete`] marking a stage done.
    pub fn with_complete(mut self, stage: &StageKind) -> Self {
        self.set_complete(stage, true);
        self
    }

    pub fn score(&self, stage: &StageKind) -> Option<f64> {
        self.scores.get(&stage.flag_key()).copied()
    }

    /// Record a stage score. Scores live on a 0–100 scale.
    pub fn set_score(&mut self, stage: &StageKind, score: f64) -> Result<()> {
        if !(0.0..=100.0).contains(&score) {
            return Err(PipelineError::Invariant(format!(
                "score {score} for {stage} is outside 0-100"
            )));
        }
        self.scores.insert(stage.flag_key(), score);
        Ok(())
    }

    pub fn clear_score(&mut self, stage: &StageKind) {
        self.scores.remove(&stage.flag_key());
    }

    pub fn details(&self, stage: &StageKind) -> Option<&StageDetails> {
        self.details.get(&stage.flag_key())
    }

    /// Attach a payload to the stage it belongs to.
    pub fn attach(&mut self, stage: &StageKind, payload: StagePayload) -> Result<()> {
        payload.check_stage(stage)?;
        let entry = self.details.entry(stage.flag_key()).or_default();
        match payload {
            StagePayload::Schedule(s) => entry.schedule = Some(s),
            StagePayload::Feedback(f) => entry.feedback = Some(f),
            StagePayload::Submission(s) => entry.submission = Some(s),
            StagePayload::Offer(o) => entry.offer = Some(o),
        }
        Ok(())
    }

    /// The weighted total as computed by the hiring service.
    pub fn total_weighted_score(&self) -> Option<f64> {
        self.total_weighted_score
    }

    pub fn set_total_weighted_score(&mut self, total: Option<f64>) {
        self.total_weighted_score = total;
    }

    /// Flag keys recorded as complete, in no particular order.
    pub fn completed_keys(&self) -> impl Iterator<Item = &str> {
        self.flags
            .iter()
            .filter(|(_, done)| **done)
            .map(|(key, _)| key.as_str())
    }
}
