//! JSON shapes consumed by external collaborators.
//!
//! Dashboards and renderers parse these payloads by field name; renames
//! are breaking changes and must show up here.

use chrono::{TimeZone, Utc};

use recert::compliance::{self, ComplianceSnapshot};
use recert::config::ComplianceConfig;
use recert::core::{Evaluator, Level};
use recert::error::{ErrorCode, StructuredError};
use recert::recycling;

fn sample_snapshot() -> ComplianceSnapshot {
    compliance::snapshot(
        &[],
        &ComplianceConfig::default(),
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
    )
}

#[test]
fn test_snapshot_field_names() {
    let json = serde_json::to_value(sample_snapshot()).unwrap();
    for field in [
        "total_hours",
        "live_hours",
        "online_hours",
        "required_hours",
        "is_compliant",
        "live_ratio",
        "is_live_ratio_compliant",
        "is_at_risk_next_year",
        "yearly_summary",
    ] {
        assert!(json.get(field).is_some(), "snapshot lost field {field}");
    }
}

#[test]
fn test_recycling_status_field_names() {
    let status = recycling::evaluate(
        Some(12),
        Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap(),
    );
    let json = serde_json::to_value(status).unwrap();
    assert_eq!(json.get("state").unwrap(), "expired");
    assert!(json.get("due_date").is_some());
    assert!(json.get("warning_date").is_some());
}

#[test]
fn test_level_uses_lowercase_wire_form() {
    assert_eq!(
        serde_json::to_string(&Level::Intermediate).unwrap(),
        "\"intermediate\""
    );
    let parsed: Level = serde_json::from_str("\"expert\"").unwrap();
    assert_eq!(parsed, Level::Expert);
}

#[test]
fn test_evaluator_wire_form_is_tagged() {
    let internal = serde_json::to_value(Evaluator::internal(7)).unwrap();
    assert_eq!(internal.get("kind").unwrap(), "internal");
    assert_eq!(internal.get("user_id").unwrap(), 7);

    let external = serde_json::to_value(Evaluator::external("Acme")).unwrap();
    assert_eq!(external.get("kind").unwrap(), "external");
    assert_eq!(external.get("name").unwrap(), "Acme");
}

#[test]
fn test_structured_error_wire_form() {
    let err = StructuredError::new(ErrorCode::Unauthorized, "no scope");
    let json = serde_json::to_value(err).unwrap();
    assert_eq!(json.get("code").unwrap(), "UNAUTHORIZED");
    assert_eq!(json.get("numeric_code").unwrap(), 201);
    assert_eq!(json.get("category").unwrap(), "authorization");
}
