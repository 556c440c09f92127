//! Date-window arithmetic pinned against the reference constants.

use chrono::{Datelike, TimeZone, Utc};

use recert::compliance;
use recert::recycling;

#[test]
fn test_twelve_month_validity_lands_on_new_year() {
    // 12 * 30.44 days = 365.28 days: evidence on 2023-01-01 is due
    // around 2024-01-01 and definitely expired by 2024-02-01.
    let evidence = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
    let due = recycling::due_date(12, evidence);
    assert_eq!(due.year(), 2024);
    assert_eq!(due.month(), 1);
    assert_eq!(due.day(), 1);

    let status = recycling::evaluate(
        Some(12),
        evidence,
        Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap(),
    );
    assert!(status.needs_recycling());
}

#[test]
fn test_warning_window_is_one_quarter() {
    // 12-month validity: warning opens 3 average months before the due
    // date.
    let evidence = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
    let status = recycling::evaluate(Some(12), evidence, evidence);
    let due = status.due_date.unwrap();
    let warning = status.warning_date.unwrap();
    assert_eq!((due - warning).num_seconds(), 3 * 2_630_016);
}

#[test]
fn test_six_year_window_uses_quarter_day_years() {
    let as_of = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
    let start = compliance::window_start(6, as_of);
    // 6 * 365.25 days = 2191.5 days.
    assert_eq!((as_of - start).num_hours(), 2191 * 24 + 12);
}

#[test]
fn test_at_risk_window_is_shorter_than_compliance_window() {
    let as_of = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
    assert!(compliance::window_start(5, as_of) > compliance::window_start(6, as_of));
}
