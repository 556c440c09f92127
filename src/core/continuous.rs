//! Continuous-training (continuing education) types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{RecertError, Result};

/// Delivery mode of a continuing-education event.
///
/// Regulatory compliance tracks the ratio of live hours against the
/// total, so the two modes are kept distinct end to end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    #[default]
    Live,
    Online,
}

impl DeliveryMode {
    /// Stable string form used by storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Online => "online",
        }
    }

    /// Parse the storage string form.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "live" => Ok(Self::Live),
            "online" => Ok(Self::Online),
            other => Err(RecertError::InvalidEvidence(format!(
                "unknown delivery mode '{other}'"
            ))),
        }
    }
}

/// Validation status of a continuous-training attendance record.
///
/// Transitions Pending -> {Approved, Rejected} exactly once;
/// re-validation is out of scope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl AttendanceStatus {
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
                "unknown attendance status '{other}'"
            ))),
        }
    }

    /// Whether the status is terminal (approved or rejected).
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// A continuing-education event staff can attend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContinuousTrainingEvent {
    /// Unique event ID
    pub id: i64,
    /// Event title
    pub title: String,
    /// Date the event takes place
    pub date: DateTime<Utc>,
    /// Delivery mode
    pub mode: DeliveryMode,
    /// Nominal duration in hours, used as the default validated hour
    /// count on approval
    pub duration_hours: f64,
}

/// A user's attendance of a continuing-education event.
///
/// Created on self-submission; mutated only by a validator action.
/// `validated_hours` is set on approval and treated as 0 when never set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContinuousTrainingRecord {
    /// Unique record ID
    pub id: i64,
    /// Attending user
    pub user_id: i64,
    /// Attended event
    pub event_id: i64,
    /// Validation status
    pub status: AttendanceStatus,
    /// Hour count granted by the validator
    pub validated_hours: Option<f64>,
}

impl ContinuousTrainingRecord {
    /// Hours this record contributes to compliance: the validated count
    /// when approved, zero otherwise.
    #[must_use]
    pub fn countable_hours(&self) -> f64 {
        match self.status {
            AttendanceStatus::Approved => self.validated_hours.unwrap_or(0.0),
            AttendanceStatus::Pending | AttendanceStatus::Rejected => 0.0,
        }
    }
}
