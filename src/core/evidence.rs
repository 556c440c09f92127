//! Evidence sources: training sessions and external trainings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::context::ContextSet;
use crate::core::skill::Level;
use crate::error::{RecertError, Result};

/// Lifecycle status of an external-training record.
///
/// Transitions Pending -> {Approved, Rejected} exactly once. Re-validating
/// a terminal record is a soft no-op, never a second mutation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExternalTrainingStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl ExternalTrainingStatus {
    /// Stable string form used by storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Parse the storage string form.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(RecertError::InvalidEvidence(format!(
                "unknown external-training status '{other}'"
            ))),
        }
    }

    /// Whether the status is terminal (approved or rejected).
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// A claim attached to an external training: "I trained on skill S at
/// level L for these contexts". Consumed once by the reconciler when the
/// training is approved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceClaim {
    /// Claimed skill
    pub skill_id: i64,
    /// Claimed proficiency level
    pub level: Level,
    /// Contexts the claimant trained on; may differ from the skill's
    /// default contexts
    pub contexts: ContextSet,
    /// Optional practice date to record alongside the certification
    pub practice_date: Option<DateTime<Utc>>,
    /// Whether the claimant volunteers as tutor for the skill
    pub wants_tutor: bool,
}

/// A training attended outside the organization, submitted by the user
/// and validated by a validator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalTraining {
    /// Unique training ID
    pub id: i64,
    /// Submitting user
    pub user_id: i64,
    /// External trainer name, if the training was delivered by a named
    /// third party
    pub trainer_name: Option<String>,
    /// Date the training took place
    pub date: DateTime<Utc>,
    /// Validation status
    pub status: ExternalTrainingStatus,
    /// Validator who approved or rejected, once terminal
    pub validator_id: Option<i64>,
    /// Per-skill claims
    pub claims: Vec<EvidenceClaim>,
}

/// An internal training session: a tutor teaches covered skills to
/// attendees, then validates who acquired what.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingSession {
    /// Unique session ID
    pub id: i64,
    /// Session title
    pub title: String,
    /// Location
    pub location: String,
    /// Scheduled start
    pub start_time: DateTime<Utc>,
    /// Scheduled end
    pub end_time: DateTime<Utc>,
    /// Session tutor
    pub tutor_id: Option<i64>,
    /// Attendee user ids
    pub attendee_ids: Vec<i64>,
    /// Covered skill ids
    pub skill_ids: Vec<i64>,
    /// True once every (attendee, covered skill) pair has an evaluated
    /// competency
    pub realized: bool,
}

/// One (attendee, skill, level) line of a session validation batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSubmission {
    /// Attendee being validated
    pub attendee_id: i64,
    /// Covered skill being validated
    pub skill_id: i64,
    /// Level the validator observed
    pub level: Level,
}
