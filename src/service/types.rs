//! Request and response bodies exchanged with the hiring-data service.

use serde::{Deserialize, Serialize};

use crate::pipeline::{CandidateId, StageKind};

/// Whether a workflow save created the definition or replaced one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveOutcome {
    Created,
    Updated,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveWorkflowResponse {
    pub status: SaveOutcome,
}

/// Answer to "what comes next for this candidate". `next_step: null` means
/// there is no further stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextStepResponse {
    #[serde(default)]
    pub next_step: Option<StageKind>,
}

/// Result of an advance request. When `completed` is set the candidate has
/// finished the last stage and `current_step` carries no meaning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvanceResponse {
    #[serde(default)]
    pub current_step: Option<StageKind>,
    #[serde(default)]
    pub completed: bool,
}

impl AdvanceResponse {
    pub fn moved_to(stage: StageKind) -> Self {
        Self {
            current_step: Some(stage),
            completed: false,
        }
    }

    pub fn complete() -> Self {
        Self {
            current_step: None,
            completed: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgProfile {
    pub organization_id: String,
    #[serde(default)]
    pub name: String,
    /// Set once the service has finished populating the organization's data.
    #[serde(default)]
    pub populated: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceErrorBody {
    #[serde(alias = "error")]
    pub message: String,
}

/// Body of a stage-detail recording call.
#[derive(Debug, Clone, Serialize)]
pub struct RecordRequest<'a, T: Serialize> {
    pub candidate_id: &'a CandidateId,
    pub stage: &'a StageKind,
    #[serde(flatten)]
    pub payload: &'a T,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_outcome_is_lowercase() {
        let resp: SaveWorkflowResponse = serde_json::from_str(r#"{"status": "created"}"#).unwrap();
        assert_eq!(resp.status, SaveOutcome::Created);
        assert_eq!(
            serde_json::to_string(&SaveOutcome::Updated).unwrap(),
            r#""updated""#
        );
    }

    #[test]
    fn next_step_null_is_none() {
        let resp: NextStepResponse = serde_json::from_str(r#"{"next_step": null}"#).unwrap();
        assert_eq!(resp.next_step, None);
        let resp: NextStepResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(resp.next_step, None);
        let resp: NextStepResponse =
            serde_json::from_str(r#"{"next_step": "Final Interview"}"#).unwrap();
        assert_eq!(resp.next_step, Some(StageKind::FinalInterview));
    }

    #[test]
    fn advance_response_shapes() {
        let resp: AdvanceResponse =
            serde_json::from_str(r#"{"current_step": "Offer Stage", "completed": false}"#).unwrap();
        assert_eq!(resp, AdvanceResponse::moved_to(StageKind::OfferStage));
        let resp: AdvanceResponse = serde_json::from_str(r#"{"completed": true}"#).unwrap();
        assert_eq!(resp, AdvanceResponse::complete());
    }

    #[test]
    fn record_request_flattens_payload() {
        let id = CandidateId::from("c-7");
        let feedback = crate::pipeline::Feedback {
            text: "Great".into(),
            author: None,
        };
        let body = RecordRequest {
            candidate_id: &id,
            stage: &StageKind::FinalInterview,
            payload: &feedback,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["candidate_id"], "c-7");
        assert_eq!(json["stage"], "Final Interview");
        assert_eq!(json["text"], "Great");
    }

    #[test]
    fn error_body_accepts_error_alias() {
        let body: ServiceErrorBody = serde_json::from_str(r#"{"error": "expired"}"#).unwrap();
        assert_eq!(body.message, "expired");
    }
}
