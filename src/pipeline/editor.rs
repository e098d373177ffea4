use tracing::{info, warn};

use super::catalog::{StageCatalog, StageKind};
use super::definition::{Stage, WorkflowDefinition};
use crate::error::{PipelineError, Result};
use crate::service::{HiringService, SaveOutcome, ServiceError};

/// Number of stages pinned at the front and back of every configured list.
const HEAD_LEN: usize = StageCatalog::HEAD.len();
const TAIL_LEN: usize = StageCatalog::TAIL.len();

/// The reference configuration: only the mandatory stages.
pub fn default_stages() -> Vec<Stage> {
    StageCatalog::mandatory().into_iter().map(Stage::new).collect()
}

/// Reorder the interior of `list` so the stages named in `new_order` come
/// first, in that order.
///
/// The first stage and the last two stages are never touched. Entries of
/// `new_order` that are mandatory, pinned in `list`, or repeated are skipped.
/// Configured interior stages that `new_order` leaves out keep their relative
/// order after the named ones; a reorder never drops a stage.
/// A list too short to have an interior is returned unchanged.
pub fn reorder_optional(list: &[Stage], new_order: &[Stage]) -> Vec<Stage> {
    if list.len() < HEAD_LEN + TAIL_LEN {
        return list.to_vec();
    }
    let (head, rest) = list.split_at(HEAD_LEN);
    let (current, tail) = rest.split_at(rest.len() - TAIL_LEN);

    let mut interior: Vec<Stage> = Vec::with_capacity(current.len() + new_order.len());
    for stage in new_order {
        let pinned = head.iter().chain(tail).any(|p| p.kind == stage.kind);
        let seen = interior.iter().any(|s| s.kind == stage.kind);
        if stage.mandatory || StageCatalog::is_mandatory(&stage.kind) || pinned || seen {
            continue;
        }
        interior.push(stage.clone());
    }
    for stage in current {
        if !interior.iter().any(|s| s.kind == stage.kind) {
            interior.push(stage.clone());
        }
    }

    head.iter()
        .cloned()
        .chain(interior)
        .chain(tail.iter().cloned())
        .collect()
}

/// Remove an optional stage, keeping the relative order of the rest.
/// Mandatory or absent stages leave the list unchanged.
pub fn remove_optional(list: &[Stage], stage: &StageKind) -> Vec<Stage> {
    if StageCatalog::is_mandatory(stage) {
        return list.to_vec();
    }
    list.iter().filter(|s| s.kind != *stage).cloned().collect()
}

/// Insert an optional stage just before the pinned tail. Mandatory or
/// already configured stages leave the list unchanged.
pub fn add_optional(list: &[Stage], stage: Stage) -> Vec<Stage> {
    if StageCatalog::is_mandatory(&stage.kind) || list.iter().any(|s| s.kind == stage.kind) {
        return list.to_vec();
    }
    let mut out = list.to_vec();
    let at = out.len().saturating_sub(TAIL_LEN).max(HEAD_LEN.min(out.len()));
    out.insert(at, stage);
    out
}

/// What `load` found on the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    /// The organization has never saved a workflow; the editor holds the defaults.
    Unconfigured,
}

/// Editing session over one organization's workflow.
///
/// The working list only changes through the editing methods and successful
/// loads. A failed load or save leaves it as it was, so retrying is safe.
pub struct PipelineEditor<S> {
    service: S,
    stages: Vec<Stage>,
    persisted: Option<WorkflowDefinition>,
}

impl<S: HiringService> PipelineEditor<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            stages: Vec::new(),
            persisted: None,
        }
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn definition(&self) -> WorkflowDefinition {
        WorkflowDefinition::from_ordered_list(&self.stages)
    }

    /// Whether the working list differs from what was last loaded or saved.
    pub fn is_dirty(&self) -> bool {
        match &self.persisted {
            Some(def) => *def != self.definition(),
            None => !self.stages.is_empty(),
        }
    }

    pub async fn load(&mut self) -> Result<LoadOutcome> {
        match self.service.get_workflow().await {
            Ok(def) => {
                info!(stages = def.len(), "workflow loaded");
                self.stages = def.to_ordered_list();
                self.persisted = Some(def);
                Ok(LoadOutcome::Loaded)
            }
            Err(ServiceError::NotFound { .. }) => {
                info!("no workflow configured yet, starting from defaults");
                self.stages = default_stages();
                self.persisted = None;
                Ok(LoadOutcome::Unconfigured)
            }
            Err(err) => {
                warn!(error = %err, "workflow load failed");
                Err(err.into())
            }
        }
    }

    /// Persist the whole working list. Rejected locally if it breaks the
    /// pinning invariant; the service is not contacted in that case.
    pub async fn save(&mut self) -> Result<SaveOutcome> {
        let def = self.definition();
        def.validate()?;
        let outcome = self.service.save_workflow(&def).await.map_err(|err| {
            warn!(error = %err, "workflow save failed");
            PipelineError::from(err)
        })?;
        info!(stages = def.len(), ?outcome, "workflow saved");
        self.persisted = Some(def);
        Ok(outcome)
    }

    pub fn reorder(&mut self, new_order: &[Stage]) {
        self.stages = reorder_optional(&self.stages, new_order);
    }

    /// Reorder by stage kind, the form a drag-and-drop screen produces.
    pub fn reorder_kinds(&mut self, new_order: &[StageKind]) {
        let order: Vec<Stage> = new_order.iter().cloned().map(Stage::new).collect();
        self.reorder(&order);
    }

    /// Returns `Ok(false)` when the stage was not configured.
    pub fn remove_stage(&mut self, stage: &StageKind) -> Result<bool> {
        if StageCatalog::is_mandatory(stage) {
            return Err(PipelineError::Invariant(format!(
                "{stage} is a mandatory stage and cannot be removed"
            )));
        }
        let before = self.stages.len();
        self.stages = remove_optional(&self.stages, stage);
        Ok(self.stages.len() < before)
    }

    /// Returns `Ok(false)` when the stage was already configured.
    pub fn add_stage(&mut self, stage: StageKind) -> Result<bool> {
        if StageCatalog::is_mandatory(&stage) {
            return Err(PipelineError::Invariant(format!(
                "{stage} is a mandatory stage and is always present"
            )));
        }
        let before = self.stages.len();
        self.stages = add_optional(&self.stages, Stage::new(stage));
        Ok(self.stages.len() > before)
    }
}
