//! Continuous-training aggregator.
//!
//! Sums approved continuing-education hours per person over a rolling
//! multi-year window, split by delivery mode, and evaluates the
//! regulatory thresholds. All functions are pure over plain data with an
//! explicit `as_of`; the caller joins records to their events.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ComplianceConfig;
use crate::core::{AttendanceStatus, ContinuousTrainingEvent, ContinuousTrainingRecord, DeliveryMode};

/// Seconds in one window year (365.25 days). Integer, so window bounds
/// are exact and reproducible.
const SECONDS_PER_YEAR: i64 = 31_557_600;

/// A user's attendance joined to its event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attendance {
    pub record: ContinuousTrainingRecord,
    pub event: ContinuousTrainingEvent,
}

/// Hours of one calendar year, split by validation state and mode.
///
/// Pending hours use the event's nominal duration; they chart what is in
/// flight, not what counts toward compliance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct YearlyHours {
    pub validated_live: f64,
    pub validated_online: f64,
    pub pending_live: f64,
    pub pending_online: f64,
}

/// Compliance evaluation of one user at one point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceSnapshot {
    /// Approved hours in the window, both modes
    pub total_hours: f64,
    /// Approved live hours in the window
    pub live_hours: f64,
    /// Approved online hours in the window
    pub online_hours: f64,
    /// Required hours for the window
    pub required_hours: f64,
    /// Whether `total_hours >= required_hours` (inclusive)
    pub is_compliant: bool,
    /// Live share of total hours; 0.0 when no hours yet
    pub live_ratio: f64,
    /// Ratio requirement; vacuously true with no hours yet
    pub is_live_ratio_compliant: bool,
    /// Heuristic: trailing shorter window falls below its threshold
    pub is_at_risk_next_year: bool,
    /// Calendar-year hour buckets over the window span
    pub yearly_summary: BTreeMap<i32, YearlyHours>,
}

/// Start of a trailing window of `years` ending at `as_of`.
#[must_use]
pub fn window_start(years: u32, as_of: DateTime<Utc>) -> DateTime<Utc> {
    as_of - Duration::seconds(i64::from(years) * SECONDS_PER_YEAR)
}

/// Approved hours inside `[start, as_of)` for one delivery mode.
fn approved_hours_in_window(
    attendances: &[Attendance],
    mode: DeliveryMode,
    start: DateTime<Utc>,
    as_of: DateTime<Utc>,
) -> f64 {
    attendances
        .iter()
        .filter(|a| a.event.mode == mode)
        .filter(|a| a.event.date >= start && a.event.date < as_of)
        .map(|a| a.record.countable_hours())
        .sum()
}

/// Bucket hours by the calendar year of the event date.
///
/// Buckets cover every year the compliance window touches, independent of
/// exact window boundaries, so charts line up with calendar years.
fn yearly_summary(
    attendances: &[Attendance],
    window_years: u32,
    as_of: DateTime<Utc>,
) -> BTreeMap<i32, YearlyHours> {
    let first_year = window_start(window_years, as_of).year();
    let last_year = as_of.year();

    let mut buckets: BTreeMap<i32, YearlyHours> =
        (first_year..=last_year).map(|y| (y, YearlyHours::default())).collect();

    for attendance in attendances {
        let year = attendance.event.date.year();
        let Some(bucket) = buckets.get_mut(&year) else {
            continue;
        };
        match attendance.record.status {
            AttendanceStatus::Approved => {
                let hours = attendance.record.countable_hours();
                match attendance.event.mode {
                    DeliveryMode::Live => bucket.validated_live += hours,
                    DeliveryMode::Online => bucket.validated_online += hours,
                }
            }
            AttendanceStatus::Pending => {
                let hours = attendance.event.duration_hours;
                match attendance.event.mode {
                    DeliveryMode::Live => bucket.pending_live += hours,
                    DeliveryMode::Online => bucket.pending_online += hours,
                }
            }
            AttendanceStatus::Rejected => {}
        }
    }

    buckets
}

/// Evaluate a user's continuous-training compliance at `as_of`.
#[must_use]
pub fn snapshot(
    attendances: &[Attendance],
    config: &ComplianceConfig,
    as_of: DateTime<Utc>,
) -> ComplianceSnapshot {
    let start = window_start(config.window_years, as_of);
    let live_hours = approved_hours_in_window(attendances, DeliveryMode::Live, start, as_of);
    let online_hours = approved_hours_in_window(attendances, DeliveryMode::Online, start, as_of);
    let total_hours = live_hours + online_hours;
    let required_hours = config.required_hours();

    let live_ratio = if total_hours > 0.0 {
        live_hours / total_hours
    } else {
        0.0
    };
    // No training yet cannot fail the ratio test.
    let is_live_ratio_compliant =
        total_hours == 0.0 || live_ratio >= config.live_ratio_threshold;

    // Distinct, shorter trailing window; not the compliance window.
    let at_risk_start = window_start(config.at_risk_window_years, as_of);
    let at_risk_hours =
        approved_hours_in_window(attendances, DeliveryMode::Live, at_risk_start, as_of)
            + approved_hours_in_window(attendances, DeliveryMode::Online, at_risk_start, as_of);
    let is_at_risk_next_year = at_risk_hours < config.at_risk_hours();

    ComplianceSnapshot {
        total_hours,
        live_hours,
        online_hours,
        required_hours,
        is_compliant: total_hours >= required_hours,
        live_ratio,
        is_live_ratio_compliant,
        is_at_risk_next_year,
        yearly_summary: yearly_summary(attendances, config.window_years, as_of),
    }
}
