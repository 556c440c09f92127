//! Plain-data domain types.
//!
//! The engine consumes and produces these types only; persistence and
//! transport stay behind the storage layer and the CLI.

pub mod competency;
pub mod context;
pub mod continuous;
pub mod evidence;
pub mod skill;

pub use competency::{Competency, Evaluator, PracticeEvent};
pub use context::{Context, ContextSet};
pub use continuous::{
    AttendanceStatus, ContinuousTrainingEvent, ContinuousTrainingRecord, DeliveryMode,
};
pub use evidence::{
    EvidenceClaim, ExternalTraining, ExternalTrainingStatus, SessionSubmission, TrainingSession,
};
pub use skill::{Complexity, Level, Skill, User};
