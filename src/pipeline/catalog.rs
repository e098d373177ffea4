use std::fmt;

use serde::{Deserialize, Serialize};

/// One recognized hiring stage, or an organization-defined one.
///
/// Known stages compare exhaustively; anything the catalog does not recognize
/// is carried as [`StageKind::Custom`] with the organization's label intact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StageKind {
    ApplicationScreening,
    Assessment,
    InitialInterview,
    TechnicalInterview,
    HrInterview,
    FinalInterview,
    OfferStage,
    Custom(String),
}

const KNOWN: &[StageKind] = &[
    StageKind::ApplicationScreening,
    StageKind::Assessment,
    StageKind::InitialInterview,
    StageKind::TechnicalInterview,
    StageKind::HrInterview,
    StageKind::FinalInterview,
    StageKind::OfferStage,
];

impl StageKind {
    /// Parse a display label. Known stages match regardless of case and
    /// surrounding whitespace; everything else becomes `Custom`.
    pub fn from_label(label: &str) -> Self {
        let normalized = normalize(label);
        KNOWN
            .iter()
            .find(|kind| normalize(kind.label()) == normalized)
            .cloned()
            .unwrap_or_else(|| StageKind::Custom(label.trim().to_string()))
    }

    /// Human-readable name, also the value sent over the wire.
    pub fn label(&self) -> &str {
        match self {
            StageKind::ApplicationScreening => "Application Screening",
            StageKind::Assessment => "Assessment",
            StageKind::InitialInterview => "Initial Interview",
            StageKind::TechnicalInterview => "Technical Interview",
            StageKind::HrInterview => "HR Interview",
            StageKind::FinalInterview => "Final Interview",
            StageKind::OfferStage => "Offer Stage",
            StageKind::Custom(label) => label,
        }
    }

    /// Identity of this stage's completion flag in a candidate's progress row.
    pub fn flag_key(&self) -> String {
        match self {
            StageKind::ApplicationScreening => "application_screening".into(),
            StageKind::Assessment => "assessment".into(),
            StageKind::InitialInterview => "initial_interview".into(),
            StageKind::TechnicalInterview => "technical_interview".into(),
            StageKind::HrInterview => "hr_interview".into(),
            StageKind::FinalInterview => "final_interview".into(),
            StageKind::OfferStage => "offer_stage".into(),
            StageKind::Custom(label) => slug(label),
        }
    }

    /// Whether an interview schedule may be attached to this stage.
    pub fn is_interview(&self) -> bool {
        match self {
            StageKind::InitialInterview
            | StageKind::TechnicalInterview
            | StageKind::HrInterview
            | StageKind::FinalInterview => true,
            StageKind::Custom(label) => label.to_lowercase().contains("interview"),
            _ => false,
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, StageKind::Custom(_))
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<String> for StageKind {
    fn from(label: String) -> Self {
        StageKind::from_label(&label)
    }
}

impl From<&str> for StageKind {
    fn from(label: &str) -> Self {
        StageKind::from_label(label)
    }
}

impl From<StageKind> for String {
    fn from(kind: StageKind) -> Self {
        kind.label().to_string()
    }
}

fn normalize(label: &str) -> String {
    label.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

fn slug(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    for c in label.trim().chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('_') && !out.is_empty() {
            out.push('_');
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}

/// Where a mandatory stage sits in every configured pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pin {
    /// Always the first stage.
    Head,
    /// Part of the fixed tail; the index orders members within it.
    Tail(usize),
}

/// Static knowledge about the recognized stages.
pub struct StageCatalog;

impl StageCatalog {
    /// Stages pinned before every optional stage, in order.
    pub const HEAD: &'static [StageKind] = &[StageKind::ApplicationScreening];

    /// Stages pinned after every optional stage, in order.
    pub const TAIL: &'static [StageKind] = &[StageKind::FinalInterview, StageKind::OfferStage];

    pub fn is_mandatory(stage: &StageKind) -> bool {
        Self::pin(stage).is_some()
    }

    pub fn pin(stage: &StageKind) -> Option<Pin> {
        if Self::HEAD.contains(stage) {
            return Some(Pin::Head);
        }
        Self::TAIL
            .iter()
            .position(|s| s == stage)
            .map(Pin::Tail)
    }

    /// The mandatory stages in their fixed order.
    pub fn mandatory() -> Vec<StageKind> {
        Self::HEAD.iter().chain(Self::TAIL).cloned().collect()
    }

    /// UI text for a stage. Unrecognized stages get a generic description
    /// so organization-defined names stay usable.
    pub fn describe(stage: &StageKind) -> &'static str {
        match stage {
            StageKind::ApplicationScreening => {
                "Initial review of the candidate's application and resume against the job requirements."
            }
            StageKind::Assessment => {
                "A take-home or timed assignment measuring the skills the role needs."
            }
            StageKind::InitialInterview => {
                "A first conversation to confirm fit, motivation and basic qualifications."
            }
            StageKind::TechnicalInterview => {
                "An in-depth interview focused on technical ability and problem solving."
            }
            StageKind::HrInterview => {
                "A conversation with HR covering expectations, culture and logistics."
            }
            StageKind::FinalInterview => {
                "The closing interview with the hiring manager or panel before a decision."
            }
            StageKind::OfferStage => {
                "The offer is prepared, extended and negotiated with the candidate."
            }
            StageKind::Custom(_) => "A custom stage defined by your organization.",
        }
    }
}
