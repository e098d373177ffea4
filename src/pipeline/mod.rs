mod advancement;
mod catalog;
mod definition;
mod details;
mod editor;
mod progress;
mod resolver;
mod scores;

pub use advancement::{AdvanceOutcome, AdvancementProtocol, CandidateSnapshot};
pub use catalog::{Pin, StageCatalog, StageKind};
pub use definition::{SlotKey, Stage, WorkflowDefinition};
pub use details::StageRecorder;
pub use editor::{
    LoadOutcome, PipelineEditor, add_optional, default_stages, remove_optional, reorder_optional,
};
pub use progress::{
    AssignmentSubmission, CandidateId, CandidateProgress, Feedback, InterviewSchedule, OfferTerms,
    StageDetails, StagePayload,
};
pub use resolver::StageResolver;
pub use scores::{ScoreAggregator, StageReport};
