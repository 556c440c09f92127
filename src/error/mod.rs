//! Error handling for recert.
//!
//! This module provides:
//! - [`RecertError`]: The main error enum for all engine operations
//! - [`ErrorCode`]: Standardized error codes for machine parsing
//! - [`StructuredError`]: Rich error type for JSON output

mod codes;

use std::io;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use codes::ErrorCode;

/// Main error type for recert operations.
#[derive(Error, Debug)]
pub enum RecertError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Missing required config: {0}")]
    MissingConfig(String),

    #[error("User not found: {0}")]
    UserNotFound(i64),

    #[error("Skill not found: {0}")]
    SkillNotFound(i64),

    #[error("Competency not found: {0}")]
    CompetencyNotFound(i64),

    #[error("Training session not found: {0}")]
    SessionNotFound(i64),

    #[error("External training not found: {0}")]
    TrainingNotFound(i64),

    #[error("Continuous-training event not found: {0}")]
    EventNotFound(i64),

    #[error("Context not found: {0}")]
    ContextNotFound(i64),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid evidence: {0}")]
    InvalidEvidence(String),

    #[error("Duplicate submission: {0}")]
    DuplicateSubmission(String),

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

impl RecertError {
    /// Get the error code for this error.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Database(_) => ErrorCode::DatabaseError,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::SerializationError,
            Self::Config(_) => ErrorCode::ConfigInvalid,
            Self::MissingConfig(_) => ErrorCode::ConfigMissingRequired,
            Self::UserNotFound(_) => ErrorCode::UserNotFound,
            Self::SkillNotFound(_) => ErrorCode::SkillNotFound,
            Self::CompetencyNotFound(_) => ErrorCode::CompetencyNotFound,
            Self::SessionNotFound(_) => ErrorCode::SessionNotFound,
            Self::TrainingNotFound(_) => ErrorCode::TrainingNotFound,
            Self::EventNotFound(_) => ErrorCode::EventNotFound,
            Self::ContextNotFound(_) => ErrorCode::ContextNotFound,
            Self::Unauthorized(_) => ErrorCode::Unauthorized,
            Self::InvalidEvidence(_) => ErrorCode::InvalidEvidence,
            Self::DuplicateSubmission(_) => ErrorCode::DuplicateSubmission,
            Self::InvariantViolation(_) => ErrorCode::InvariantViolation,
        }
    }

    /// Get context information for this error as JSON.
    #[must_use]
    pub fn context(&self) -> Option<Value> {
        match self {
            Self::UserNotFound(id) => Some(serde_json::json!({ "user_id": id })),
            Self::SkillNotFound(id) => Some(serde_json::json!({ "skill_id": id })),
            Self::CompetencyNotFound(id) => Some(serde_json::json!({ "competency_id": id })),
            Self::SessionNotFound(id) => Some(serde_json::json!({ "session_id": id })),
            Self::TrainingNotFound(id) => Some(serde_json::json!({ "training_id": id })),
            Self::EventNotFound(id) => Some(serde_json::json!({ "event_id": id })),
            Self::ContextNotFound(id) => Some(serde_json::json!({ "context_id": id })),
            Self::MissingConfig(key) => Some(serde_json::json!({ "config_key": key })),
            _ => None,
        }
    }

    /// Convert this error to a structured error.
    #[must_use]
    pub fn to_structured(&self) -> StructuredError {
        StructuredError::from_error(self)
    }
}

/// A structured error with machine-readable code and context.
///
/// This type is designed for JSON output where external collaborators
/// need to parse errors and take appropriate action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// The error code (e.g., "SKILL_NOT_FOUND")
    pub code: ErrorCode,

    /// The numeric error code (e.g., 102)
    pub numeric_code: u16,

    /// Human-readable error message
    pub message: String,

    /// Additional context for debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,

    /// Whether this error is potentially recoverable by the caller
    pub recoverable: bool,

    /// Error category (e.g., "lookup", "evidence")
    pub category: String,
}

impl StructuredError {
    /// Create a new structured error.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            numeric_code: code.numeric(),
            message: message.into(),
            context: None,
            recoverable: code.is_recoverable(),
            category: code.category().to_string(),
            code,
        }
    }

    /// Create a structured error from a [`RecertError`].
    #[must_use]
    pub fn from_error(err: &RecertError) -> Self {
        let code = err.code();
        Self {
            code,
            numeric_code: code.numeric(),
            message: err.to_string(),
            context: err.context(),
            recoverable: code.is_recoverable(),
            category: code.category().to_string(),
        }
    }
}

impl std::fmt::Display for StructuredError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl From<RecertError> for StructuredError {
    fn from(err: RecertError) -> Self {
        Self::from_error(&err)
    }
}

/// Result type alias using RecertError.
pub type Result<T> = std::result::Result<T, RecertError>;
