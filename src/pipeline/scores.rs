use std::cmp::Ordering;

use serde::Serialize;

use super::catalog::StageKind;
use super::definition::WorkflowDefinition;
use super::progress::CandidateProgress;

/// Reporting row for one configured stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageReport {
    pub stage: StageKind,
    pub completed: bool,
    pub score: Option<f64>,
    /// Score as a progress-bar fill, 0–100.
    pub percent: Option<f64>,
}

/// Read-only views over candidate scores.
pub struct ScoreAggregator;

impl ScoreAggregator {
    /// The weighted total computed by the hiring service. The weighting is the
    /// service's concern; nothing is recomputed here.
    pub fn total_score(progress: &CandidateProgress) -> Option<f64> {
        progress.total_weighted_score()
    }

    pub fn stage_score(progress: &CandidateProgress, stage: &StageKind) -> Option<f64> {
        progress.score(stage)
    }

    /// Order candidates by one stage's score, highest first. The sort is
    /// stable; candidates without a score keep their order after scored ones.
    pub fn rank_by_stage(candidates: &mut [CandidateProgress], stage: &StageKind) {
        candidates.sort_by(|a, b| match (a.score(stage), b.score(stage)) {
            (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
    }

    /// One row per configured stage, in pipeline order.
    pub fn stage_breakdown(
        definition: &WorkflowDefinition,
        progress: &CandidateProgress,
    ) -> Vec<StageReport> {
        definition
            .kinds()
            .map(|stage| {
                let score = progress.score(stage);
                StageReport {
                    stage: stage.clone(),
                    completed: progress.is_complete(stage),
                    score,
                    percent: score.map(|s| s.clamp(0.0, 100.0)),
                }
            })
            .collect()
    }

    /// Share of configured stages the candidate has completed, 0–100.
    pub fn completion_percent(definition: &WorkflowDefinition, progress: &CandidateProgress) -> f64 {
        if definition.is_empty() {
            return 0.0;
        }
        let done = definition
            .kinds()
            .filter(|stage| progress.is_complete(stage))
            .count();
        done as f64 * 100.0 / definition.len() as f64
    }
}
