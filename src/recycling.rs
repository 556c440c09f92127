//! Recycling calculator.
//!
//! Pure functions deciding whether a competency is still valid, close to
//! its renewal date, or expired. Time never comes from the ambient clock:
//! callers pass an explicit `as_of`, so the same inputs always produce the
//! same answer and the result naturally changes as time passes without any
//! write to the record.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// The system's defined month length in days.
///
/// A deliberate average-month approximation, not calendar arithmetic.
/// Validity windows are `months * 30.44` days everywhere.
pub const DAYS_PER_MONTH: f64 = 30.44;

/// Seconds in one validity month (30.44 days). Integer, so date arithmetic
/// is exact and reproducible.
const SECONDS_PER_MONTH: i64 = 2_630_016;

/// Validity state of a competency at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecyclingState {
    /// Before the warning window opens
    Valid,
    /// Inside the warning window, renewal due soon
    RecyclingSoon,
    /// Past the due date, renewal required
    Expired,
}

/// Result of a recycling evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecyclingStatus {
    /// Validity state at `as_of`
    pub state: RecyclingState,
    /// Renewal due date; `None` for permanently valid skills
    pub due_date: Option<DateTime<Utc>>,
    /// Start of the warning window; `None` for permanently valid skills
    pub warning_date: Option<DateTime<Utc>>,
}

impl RecyclingStatus {
    /// Whether the competency has expired and must be renewed.
    #[must_use]
    pub fn needs_recycling(&self) -> bool {
        self.state == RecyclingState::Expired
    }
}

/// Renewal due date: latest evidence plus the validity period.
#[must_use]
pub fn due_date(validity_period_months: u32, latest_evidence: DateTime<Utc>) -> DateTime<Utc> {
    latest_evidence + Duration::seconds(i64::from(validity_period_months) * SECONDS_PER_MONTH)
}

/// Start of the warning window: one quarter of the validity period before
/// the due date.
#[must_use]
pub fn warning_date(validity_period_months: u32, due: DateTime<Utc>) -> DateTime<Utc> {
    due - Duration::seconds(i64::from(validity_period_months) * SECONDS_PER_MONTH / 4)
}

/// Evaluate the recycling state of a competency.
///
/// `validity_period_months` of `None` means the skill never expires: the
/// competency is permanently valid and has no due date. Otherwise the
/// state is `Valid` strictly before the warning date, `RecyclingSoon`
/// from the warning date through the due date inclusive, and `Expired`
/// strictly after the due date.
#[must_use]
pub fn evaluate(
    validity_period_months: Option<u32>,
    latest_evidence: DateTime<Utc>,
    as_of: DateTime<Utc>,
) -> RecyclingStatus {
    let Some(months) = validity_period_months else {
        return RecyclingStatus {
            state: RecyclingState::Valid,
            due_date: None,
            warning_date: None,
        };
    };

    let due = due_date(months, latest_evidence);
    let warning = warning_date(months, due);

    let state = if as_of > due {
        RecyclingState::Expired
    } else if as_of >= warning {
        RecyclingState::RecyclingSoon
    } else {
        RecyclingState::Valid
    };

    RecyclingStatus {
        state,
        due_date: Some(due),
        warning_date: Some(warning),
    }
}

/// Effective last-evidence date of a competency: the evaluation date or
/// any later practice of the same skill, whichever is latest.
///
/// Practice events that postdate the evaluation extend validity without
/// creating a new competency or bumping the level. Returns `None` when
/// the competency was never evaluated and never practiced.
#[must_use]
pub fn latest_evidence_date(
    evaluation_date: Option<DateTime<Utc>>,
    practice_dates: impl IntoIterator<Item = DateTime<Utc>>,
) -> Option<DateTime<Utc>> {
    practice_dates
        .into_iter()
        .chain(evaluation_date)
        .max()
}
