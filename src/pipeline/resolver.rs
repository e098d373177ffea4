use super::catalog::StageKind;
use super::definition::WorkflowDefinition;
use super::progress::CandidateProgress;

/// Derives a candidate's position in the pipeline from their completion flags.
pub struct StageResolver;

impl StageResolver {
    /// The candidate's current stage: the last configured stage whose flag is
    /// set, or the first stage when none is.
    ///
    /// Flags are set per stage by the service and never cleared, so scanning
    /// from the end finds the furthest completed stage. When flags are not
    /// monotonic the furthest true flag still wins; earlier gaps are ignored.
    /// Returns `None` only for an empty definition.
    pub fn current_stage(
        definition: &WorkflowDefinition,
        progress: &CandidateProgress,
    ) -> Option<StageKind> {
        Self::current_index(definition, progress)
            .and_then(|i| definition.kinds().nth(i).cloned())
    }

    /// The stage an advance would move the candidate to.
    ///
    /// `None` exactly when the current stage is the last configured stage and
    /// its flag is set: the process is complete. If the last stage is current
    /// without its flag (a single-stage pipeline nobody has touched yet), that
    /// stage itself is still ahead of the candidate.
    pub fn next_stage(
        definition: &WorkflowDefinition,
        progress: &CandidateProgress,
    ) -> Option<StageKind> {
        let stages: Vec<&StageKind> = definition.kinds().collect();
        let current = Self::current_index(definition, progress)?;
        match stages.get(current + 1) {
            Some(next) => Some((*next).clone()),
            None if progress.is_complete(stages[current]) => None,
            None => Some(stages[current].clone()),
        }
    }

    /// Whether the candidate has completed every configured stage.
    pub fn is_complete(definition: &WorkflowDefinition, progress: &CandidateProgress) -> bool {
        !definition.is_empty() && Self::next_stage(definition, progress).is_none()
    }

    fn current_index(
        definition: &WorkflowDefinition,
        progress: &CandidateProgress,
    ) -> Option<usize> {
        if definition.is_empty() {
            return None;
        }
        let stages: Vec<&StageKind> = definition.kinds().collect();
        Some(
            stages
                .iter()
                .rposition(|stage| progress.is_complete(stage))
                .unwrap_or(0),
        )
    }
}
