use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;

use recert::compliance::{self, Attendance};
use recert::config::ComplianceConfig;
use recert::core::{
    AttendanceStatus, Competency, ContextSet, ContinuousTrainingEvent, ContinuousTrainingRecord,
    DeliveryMode, Level,
};
use recert::matcher::{self, MatchOutcome};
use recert::recycling;
use recert::reconcile::{PracticeItem, Reconciler};
use recert::storage::{sqlite, Database};

fn arb_timestamp() -> impl Strategy<Value = DateTime<Utc>> {
    // 2000-01-01 .. 2100-01-01, second precision.
    (946_684_800i64..4_102_444_800i64).prop_map(|secs| Utc.timestamp_opt(secs, 0).unwrap())
}

fn arb_context_ids() -> impl Strategy<Value = Vec<i64>> {
    prop::collection::vec(1i64..20, 0..6)
}

proptest! {
    #[test]
    fn context_set_equality_is_order_independent(ids in arb_context_ids()) {
        let forward = ContextSet::from_ids(ids.iter().copied());
        let reversed = ContextSet::from_ids(ids.iter().rev().copied());
        prop_assert_eq!(&forward, &reversed);

        // Normalized ids are sorted and unique.
        let stored = forward.ids();
        prop_assert!(stored.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn matcher_finds_exactly_the_equal_set(
        existing_sets in prop::collection::hash_set(arb_context_ids().prop_map(ContextSet::from_ids), 0..5),
        candidate in arb_context_ids().prop_map(ContextSet::from_ids),
    ) {
        let existing: Vec<Competency> = existing_sets
            .iter()
            .enumerate()
            .map(|(i, contexts)| Competency {
                id: i64::try_from(i).unwrap() + 1,
                user_id: 1,
                skill_id: 1,
                level: Level::Novice,
                evaluation_date: None,
                evaluator: None,
                session_id: None,
                external_training_id: None,
                contexts: contexts.clone(),
            })
            .collect();

        let outcome = matcher::find_target(&existing, &candidate).unwrap();
        let expected = existing.iter().find(|c| c.contexts == candidate);
        match (outcome, expected) {
            (MatchOutcome::Existing { competency_id }, Some(comp)) => {
                prop_assert_eq!(competency_id, comp.id);
            }
            (MatchOutcome::CreateNew, None) => {}
            (got, want) => prop_assert!(false, "got {:?}, expected {:?}", got, want),
        }
    }

    #[test]
    fn recycling_dates_are_exact(
        months in 1u32..=120,
        evidence in arb_timestamp(),
    ) {
        let status = recycling::evaluate(Some(months), evidence, evidence);
        let due = status.due_date.unwrap();
        let warning = status.warning_date.unwrap();

        // due == evidence + months * 30.44 days, exactly.
        let month_seconds = i64::from(months) * 2_630_016;
        prop_assert_eq!(due - evidence, Duration::seconds(month_seconds));
        // warning == due - months * 30.44 / 4 days, exactly.
        prop_assert_eq!(due - warning, Duration::seconds(month_seconds / 4));
    }

    #[test]
    fn recycling_state_is_monotone_in_time(
        months in 1u32..=120,
        evidence in arb_timestamp(),
        offset_days in 0i64..5_000,
    ) {
        let as_of = evidence + Duration::days(offset_days);
        let status = recycling::evaluate(Some(months), evidence, as_of);
        let due = status.due_date.unwrap();
        let warning = status.warning_date.unwrap();

        use recert::recycling::RecyclingState;
        let expected = if as_of > due {
            RecyclingState::Expired
        } else if as_of >= warning {
            RecyclingState::RecyclingSoon
        } else {
            RecyclingState::Valid
        };
        prop_assert_eq!(status.state, expected);
        prop_assert_eq!(status.needs_recycling(), as_of > due);
    }

    #[test]
    fn compliance_threshold_is_inclusive(
        hours in prop::collection::vec(0.0f64..20.0, 0..10),
    ) {
        let as_of = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let attendances: Vec<Attendance> = hours
            .iter()
            .enumerate()
            .map(|(i, h)| Attendance {
                record: ContinuousTrainingRecord {
                    id: i64::try_from(i).unwrap(),
                    user_id: 1,
                    event_id: i64::try_from(i).unwrap(),
                    status: AttendanceStatus::Approved,
                    validated_hours: Some(*h),
                },
                event: ContinuousTrainingEvent {
                    id: i64::try_from(i).unwrap(),
                    title: String::new(),
                    date: as_of - Duration::days(100),
                    mode: DeliveryMode::Live,
                    duration_hours: *h,
                },
            })
            .collect();

        let config = ComplianceConfig::default();
        let snap = compliance::snapshot(&attendances, &config, as_of);
        prop_assert_eq!(snap.is_compliant, snap.total_hours >= config.required_hours());

        // All-live hours: the ratio test never fails.
        prop_assert!(snap.is_live_ratio_compliant);
        if snap.total_hours == 0.0 {
            prop_assert_eq!(snap.live_ratio, 0.0);
        }
    }

    #[test]
    fn practice_declaration_is_idempotent(practice in arb_timestamp()) {
        let mut db = Database::open_in_memory().unwrap();
        let (user, competency_id) = {
            let conn = db.conn();
            let validator = sqlite::insert_user(conn, "V", "v@example.org", true).unwrap();
            let user = sqlite::insert_user(conn, "U", "u@example.org", false).unwrap();
            let skill = sqlite::insert_skill(
                conn,
                "S",
                "",
                recert::core::Complexity::Simple,
                Some(12),
                &ContextSet::empty(),
            )
            .unwrap();
            let write = recert::storage::CompetencyWrite {
                level: Level::Novice,
                evaluation_date: Some(practice - Duration::days(1)),
                evaluator: Some(recert::core::Evaluator::internal(validator)),
                session_id: None,
                external_training_id: None,
            };
            let competency_id =
                sqlite::insert_competency(conn, user, skill, &write, &ContextSet::empty()).unwrap();
            (user, competency_id)
        };

        let item = PracticeItem {
            competency_id,
            level: None,
            practice_date: Some(practice),
            tutor_intent: None,
        };
        let first = Reconciler::new(&mut db)
            .declare_practice(user, std::slice::from_ref(&item))
            .unwrap();
        let second = Reconciler::new(&mut db)
            .declare_practice(user, std::slice::from_ref(&item))
            .unwrap();

        prop_assert_eq!(first.new_practice_events.len(), 1);
        prop_assert!(second.new_practice_events.is_empty());
        prop_assert_eq!(second.duplicate_practice_skipped, 1);
    }
}
