//! Standardized error codes for machine-parseable output.
//!
//! Error codes follow a numeric taxonomy:
//! - 1xx: Lookup errors
//! - 2xx: Authorization errors
//! - 3xx: Config errors
//! - 4xx: Evidence errors
//! - 5xx: Invariant errors
//! - 6xx: Storage errors
//! - 9xx: Internal errors

use serde::{Deserialize, Serialize};

/// Standardized error codes for JSON output.
///
/// Each variant maps to a numeric code (e.g., `SkillNotFound` -> E102).
/// Codes are grouped by category for easy identification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // ========================================
    // Lookup errors (1xx)
    // ========================================
    /// E101: Referenced user does not exist
    UserNotFound,
    /// E102: Referenced skill does not exist
    SkillNotFound,
    /// E103: Referenced competency does not exist
    CompetencyNotFound,
    /// E104: Referenced training session does not exist
    SessionNotFound,
    /// E105: Referenced external training does not exist
    TrainingNotFound,
    /// E106: Referenced continuous-training event does not exist
    EventNotFound,
    /// E107: Referenced context (species) does not exist
    ContextNotFound,

    // ========================================
    // Authorization errors (2xx)
    // ========================================
    /// E201: Validator lacks scope for the specific skill or session
    Unauthorized,

    // ========================================
    // Config errors (3xx)
    // ========================================
    /// E301: Config file has invalid syntax or values
    ConfigInvalid,
    /// E302: Required config value is missing
    ConfigMissingRequired,

    // ========================================
    // Evidence errors (4xx)
    // ========================================
    /// E401: Malformed level, context-set or hours in submitted evidence
    InvalidEvidence,
    /// E402: Idempotency check rejected a resubmission
    DuplicateSubmission,

    // ========================================
    // Invariant errors (5xx)
    // ========================================
    /// E501: A write would produce two competencies with identical context-sets
    InvariantViolation,

    // ========================================
    // Storage errors (6xx)
    // ========================================
    /// E601: Database operation failed
    DatabaseError,
    /// E602: Serialization/deserialization failed
    SerializationError,

    // ========================================
    // Internal errors (9xx)
    // ========================================
    /// E901: IO operation failed
    IoError,
}

impl ErrorCode {
    /// Get the numeric error code (e.g., `SkillNotFound` -> 102).
    #[must_use]
    pub const fn numeric(&self) -> u16 {
        match self {
            // Lookup errors (1xx)
            Self::UserNotFound => 101,
            Self::SkillNotFound => 102,
            Self::CompetencyNotFound => 103,
            Self::SessionNotFound => 104,
            Self::TrainingNotFound => 105,
            Self::EventNotFound => 106,
            Self::ContextNotFound => 107,

            // Authorization errors (2xx)
            Self::Unauthorized => 201,

            // Config errors (3xx)
            Self::ConfigInvalid => 301,
            Self::ConfigMissingRequired => 302,

            // Evidence errors (4xx)
            Self::InvalidEvidence => 401,
            Self::DuplicateSubmission => 402,

            // Invariant errors (5xx)
            Self::InvariantViolation => 501,

            // Storage errors (6xx)
            Self::DatabaseError => 601,
            Self::SerializationError => 602,

            // Internal errors (9xx)
            Self::IoError => 901,
        }
    }

    /// Get the error code as a formatted string (e.g., "E102").
    #[must_use]
    pub fn code_string(&self) -> String {
        format!("E{}", self.numeric())
    }

    /// Whether this error is potentially recoverable by the caller.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::UserNotFound
            | Self::SkillNotFound
            | Self::CompetencyNotFound
            | Self::SessionNotFound
            | Self::TrainingNotFound
            | Self::EventNotFound
            | Self::ContextNotFound
            | Self::Unauthorized
            | Self::ConfigInvalid
            | Self::ConfigMissingRequired
            | Self::InvalidEvidence
            | Self::DuplicateSubmission => true,
            Self::InvariantViolation
            | Self::DatabaseError
            | Self::SerializationError
            | Self::IoError => false,
        }
    }

    /// Get the error category name.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self.numeric() / 100 {
            1 => "lookup",
            2 => "authorization",
            3 => "config",
            4 => "evidence",
            5 => "invariant",
            6 => "storage",
            9 => "internal",
            _ => "unknown",
        }
    }

    /// Iterate over all error codes.
    pub fn all() -> impl Iterator<Item = Self> {
        [
            Self::UserNotFound,
            Self::SkillNotFound,
            Self::CompetencyNotFound,
            Self::SessionNotFound,
            Self::TrainingNotFound,
            Self::EventNotFound,
            Self::ContextNotFound,
            Self::Unauthorized,
            Self::ConfigInvalid,
            Self::ConfigMissingRequired,
            Self::InvalidEvidence,
            Self::DuplicateSubmission,
            Self::InvariantViolation,
            Self::DatabaseError,
            Self::SerializationError,
            Self::IoError,
        ]
        .into_iter()
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code_string())
    }
}
