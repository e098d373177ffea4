use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::catalog::{StageCatalog, StageKind};
use crate::error::{PipelineError, Result};

/// Ordinal slot key of a configured stage: `step1`, `step2`, ...
///
/// Orders numerically, so `step2` sorts before `step10`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotKey(u32);

impl SlotKey {
    pub fn new(ordinal: u32) -> Option<Self> {
        (ordinal > 0).then_some(SlotKey(ordinal))
    }

    pub fn ordinal(self) -> u32 {
        self.0
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step{}", self.0)
    }
}

impl FromStr for SlotKey {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.strip_prefix("step")
            .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|digits| digits.parse::<u32>().ok())
            .and_then(SlotKey::new)
            .ok_or_else(|| format!("invalid slot key `{s}`"))
    }
}

impl Serialize for SlotKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SlotKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A stage as shown in the configuration screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    pub kind: StageKind,
    pub mandatory: bool,
    pub description: String,
}

impl Stage {
    /// Build a stage with its catalog defaults.
    pub fn new(kind: StageKind) -> Self {
        Self {
            mandatory: StageCatalog::is_mandatory(&kind),
            description: StageCatalog::describe(&kind).to_string(),
            kind,
        }
    }

    pub fn name(&self) -> &str {
        self.kind.label()
    }
}

impl From<StageKind> for Stage {
    fn from(kind: StageKind) -> Self {
        Stage::new(kind)
    }
}

/// An organization's configured pipeline, keyed by slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkflowDefinition {
    slots: BTreeMap<SlotKey, StageKind>,
}

impl WorkflowDefinition {
    pub fn from_slots(slots: impl IntoIterator<Item = (SlotKey, StageKind)>) -> Self {
        Self {
            slots: slots.into_iter().collect(),
        }
    }

    /// Assign `step1..stepN` in list order. The mandatory-position invariant
    /// is the caller's responsibility; see [`WorkflowDefinition::validate`].
    pub fn from_ordered_list(stages: &[Stage]) -> Self {
        Self::from_kinds(stages.iter().map(|s| s.kind.clone()))
    }

    pub fn from_kinds(kinds: impl IntoIterator<Item = StageKind>) -> Self {
        Self {
            slots: kinds
                .into_iter()
                .zip(1u32..)
                .map(|(kind, n)| (SlotKey(n), kind))
                .collect(),
        }
    }

    /// Stages in slot order, with catalog defaults filled in.
    pub fn to_ordered_list(&self) -> Vec<Stage> {
        self.kinds().cloned().map(Stage::new).collect()
    }

    /// Stage kinds in slot order.
    pub fn kinds(&self) -> impl Iterator<Item = &StageKind> {
        self.slots.values()
    }

    pub fn slots(&self) -> &BTreeMap<SlotKey, StageKind> {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn position(&self, stage: &StageKind) -> Option<usize> {
        self.kinds().position(|k| k == stage)
    }

    /// Check that the definition can be persisted: contiguous slots from
    /// `step1`, no duplicate stages, and mandatory stages at their pinned ends.
    pub fn validate(&self) -> Result<()> {
        for (expected, key) in (1u32..).zip(self.slots.keys()) {
            if key.ordinal() != expected {
                return Err(PipelineError::Invariant(format!(
                    "slot sequence is not contiguous: expected step{expected}, found {key}"
                )));
            }
        }

        let kinds: Vec<&StageKind> = self.kinds().collect();
        for (i, kind) in kinds.iter().enumerate() {
            if kinds[..i].contains(kind) {
                return Err(PipelineError::Invariant(format!(
                    "stage `{kind}` appears more than once"
                )));
            }
        }

        let head = StageCatalog::HEAD;
        let tail = StageCatalog::TAIL;
        if kinds.len() < head.len() + tail.len() {
            return Err(PipelineError::Invariant(format!(
                "a pipeline needs at least {} stages",
                head.len() + tail.len()
            )));
        }
        let pinned_ok = kinds[..head.len()].iter().copied().eq(head.iter())
            && kinds[kinds.len() - tail.len()..].iter().copied().eq(tail.iter());
        if !pinned_ok {
            return Err(PipelineError::Invariant(format!(
                "mandatory stages must be pinned: {} first, then {} last",
                head.iter().map(StageKind::label).collect::<Vec<_>>().join(", "),
                tail.iter().map(StageKind::label).collect::<Vec<_>>().join(", ")
            )));
        }
        let interior = &kinds[head.len()..kinds.len() - tail.len()];
        if let Some(stray) = interior.iter().find(|k| StageCatalog::is_mandatory(k)) {
            return Err(PipelineError::Invariant(format!(
                "mandatory stage `{stray}` cannot sit among optional stages"
            )));
        }
        Ok(())
    }
}
