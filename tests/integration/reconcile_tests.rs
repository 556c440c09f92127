//! Reconciliation scenarios across the three evidence paths.

use recert::core::{
    ContextSet, Evaluator, EvidenceClaim, ExternalTrainingStatus, Level, SessionSubmission,
};
use recert::error::RecertError;
use recert::reconcile::{PracticeItem, Reconciler};
use recert::storage::sqlite;

use super::fixture::{date, Fixture};

// =============================================================================
// SESSION VALIDATION PATH
// =============================================================================

#[test]
fn session_validation_creates_competencies_with_skill_contexts() {
    let mut fx = Fixture::new();
    let handling = fx.skill("Handling", Some(12), &[fx.mouse, fx.rat]);
    let session = fx.session(fx.validator, &[fx.alice], &[handling]);

    let outcome = Reconciler::new(&mut fx.db)
        .validate_session(
            session,
            fx.validator,
            &[SessionSubmission {
                attendee_id: fx.alice,
                skill_id: handling,
                level: Level::Intermediate,
            }],
            date(2024, 1, 11),
        )
        .unwrap();

    assert_eq!(outcome.updated_competencies.len(), 1);
    assert!(outcome.session_now_realized);

    let comp = sqlite::get_competency(fx.db.conn(), outcome.updated_competencies[0]).unwrap();
    assert_eq!(comp.level, Level::Intermediate);
    assert_eq!(comp.contexts, ContextSet::from_ids([fx.mouse, fx.rat]));
    assert_eq!(comp.evaluator, Some(Evaluator::internal(fx.validator)));
    assert_eq!(comp.session_id, Some(session));
    assert_eq!(comp.evaluation_date, Some(date(2024, 1, 11)));
    fx.assert_distinct_context_sets();
}

#[test]
fn session_not_realized_until_every_pair_is_evaluated() {
    let mut fx = Fixture::new();
    let handling = fx.skill("Handling", Some(12), &[fx.mouse]);
    let welfare = fx.skill("Welfare", None, &[]);
    let session = fx.session(fx.validator, &[fx.alice], &[handling, welfare]);

    // Only one of the two covered skills gets a level.
    let outcome = Reconciler::new(&mut fx.db)
        .validate_session(
            session,
            fx.validator,
            &[SessionSubmission {
                attendee_id: fx.alice,
                skill_id: handling,
                level: Level::Novice,
            }],
            date(2024, 1, 11),
        )
        .unwrap();
    assert!(!outcome.session_now_realized);
    assert!(!sqlite::get_session(fx.db.conn(), session).unwrap().realized);

    // A later validation supplies the missing level.
    let outcome = Reconciler::new(&mut fx.db)
        .validate_session(
            session,
            fx.validator,
            &[SessionSubmission {
                attendee_id: fx.alice,
                skill_id: welfare,
                level: Level::Novice,
            }],
            date(2024, 1, 20),
        )
        .unwrap();
    assert!(outcome.session_now_realized);
    assert!(sqlite::get_session(fx.db.conn(), session).unwrap().realized);
}

#[test]
fn revalidating_a_realized_session_updates_in_place() {
    let mut fx = Fixture::new();
    let handling = fx.skill("Handling", Some(12), &[fx.mouse]);
    let session = fx.session(fx.validator, &[fx.alice], &[handling]);

    let submission = [SessionSubmission {
        attendee_id: fx.alice,
        skill_id: handling,
        level: Level::Novice,
    }];
    Reconciler::new(&mut fx.db)
        .validate_session(session, fx.validator, &submission, date(2024, 1, 11))
        .unwrap();

    let upgraded = [SessionSubmission {
        attendee_id: fx.alice,
        skill_id: handling,
        level: Level::Expert,
    }];
    let outcome = Reconciler::new(&mut fx.db)
        .validate_session(session, fx.validator, &upgraded, date(2024, 2, 1))
        .unwrap();
    assert!(outcome.session_now_realized);

    // Same context-set, so still a single record, now at Expert.
    let comps = sqlite::competencies_for(fx.db.conn(), fx.alice, handling).unwrap();
    assert_eq!(comps.len(), 1);
    assert_eq!(comps[0].level, Level::Expert);
    assert_eq!(comps[0].evaluation_date, Some(date(2024, 2, 1)));
}

#[test]
fn session_validator_needs_per_skill_scope() {
    let mut fx = Fixture::new();
    let handling = fx.skill("Handling", Some(12), &[fx.mouse]);
    let anesthesia = fx.skill("Anesthesia", Some(24), &[fx.mouse]);
    // Bob tutors handling only, and has no global role.
    sqlite::add_tutor(fx.db.conn(), handling, fx.bob).unwrap();
    let session = fx.session(fx.bob, &[fx.alice], &[handling, anesthesia]);

    let ok = Reconciler::new(&mut fx.db).validate_session(
        session,
        fx.bob,
        &[SessionSubmission {
            attendee_id: fx.alice,
            skill_id: handling,
            level: Level::Novice,
        }],
        date(2024, 1, 11),
    );
    assert!(ok.is_ok());

    let err = Reconciler::new(&mut fx.db)
        .validate_session(
            session,
            fx.bob,
            &[SessionSubmission {
                attendee_id: fx.alice,
                skill_id: anesthesia,
                level: Level::Novice,
            }],
            date(2024, 1, 11),
        )
        .unwrap_err();
    assert!(matches!(err, RecertError::Unauthorized(_)));
}

#[test]
fn session_batch_is_all_or_nothing() {
    let mut fx = Fixture::new();
    let handling = fx.skill("Handling", Some(12), &[fx.mouse]);
    let session = fx.session(fx.validator, &[fx.alice], &[handling]);

    // Second submission names a non-attendee; the whole batch must fail.
    let err = Reconciler::new(&mut fx.db)
        .validate_session(
            session,
            fx.validator,
            &[
                SessionSubmission {
                    attendee_id: fx.alice,
                    skill_id: handling,
                    level: Level::Novice,
                },
                SessionSubmission {
                    attendee_id: fx.bob,
                    skill_id: handling,
                    level: Level::Novice,
                },
            ],
            date(2024, 1, 11),
        )
        .unwrap_err();
    assert!(matches!(err, RecertError::InvalidEvidence(_)));
    assert!(sqlite::all_competencies(fx.db.conn()).unwrap().is_empty());
}

// =============================================================================
// EXTERNAL-TRAINING APPROVAL PATH
// =============================================================================

#[test]
fn disjoint_claim_context_sets_create_two_records() {
    let mut fx = Fixture::new();
    let anesthesia = fx.skill("Anesthesia", Some(24), &[fx.mouse, fx.rat]);

    let training = sqlite::insert_external_training(
        fx.db.conn(),
        fx.alice,
        Some("Acme Courses"),
        date(2024, 1, 5),
        &[
            EvidenceClaim {
                skill_id: anesthesia,
                level: Level::Intermediate,
                contexts: ContextSet::from_ids([fx.mouse]),
                practice_date: None,
                wants_tutor: false,
            },
            EvidenceClaim {
                skill_id: anesthesia,
                level: Level::Novice,
                contexts: ContextSet::from_ids([fx.rat]),
                practice_date: None,
                wants_tutor: false,
            },
        ],
    )
    .unwrap();

    let outcome = Reconciler::new(&mut fx.db)
        .approve_external_training(training, fx.validator)
        .unwrap();
    assert_eq!(outcome.updated_competencies.len(), 2);

    let comps = sqlite::competencies_for(fx.db.conn(), fx.alice, anesthesia).unwrap();
    assert_eq!(comps.len(), 2);
    fx.assert_distinct_context_sets();
}

#[test]
fn matching_claim_context_set_updates_in_place() {
    let mut fx = Fixture::new();
    let handling = fx.skill("Handling", Some(12), &[fx.mouse, fx.rat]);
    let session = fx.session(fx.validator, &[fx.alice], &[handling]);
    Reconciler::new(&mut fx.db)
        .validate_session(
            session,
            fx.validator,
            &[SessionSubmission {
                attendee_id: fx.alice,
                skill_id: handling,
                level: Level::Novice,
            }],
            date(2024, 1, 11),
        )
        .unwrap();

    // The claim's context-set equals the skill contexts used above.
    let training = sqlite::insert_external_training(
        fx.db.conn(),
        fx.alice,
        Some("Acme Courses"),
        date(2024, 3, 1),
        &[EvidenceClaim {
            skill_id: handling,
            level: Level::Expert,
            contexts: ContextSet::from_ids([fx.rat, fx.mouse]),
            practice_date: None,
            wants_tutor: false,
        }],
    )
    .unwrap();
    Reconciler::new(&mut fx.db)
        .approve_external_training(training, fx.validator)
        .unwrap();

    let comps = sqlite::competencies_for(fx.db.conn(), fx.alice, handling).unwrap();
    assert_eq!(comps.len(), 1, "competency count must be unchanged");
    assert_eq!(comps[0].level, Level::Expert);
    assert_eq!(comps[0].evaluation_date, Some(date(2024, 3, 1)));
    // Internal evaluator was replaced by the external trainer name.
    assert_eq!(comps[0].evaluator, Some(Evaluator::external("Acme Courses")));
    assert_eq!(comps[0].external_training_id, Some(training));
    assert_eq!(comps[0].session_id, None);
}

#[test]
fn approval_without_trainer_name_uses_validator() {
    let mut fx = Fixture::new();
    let handling = fx.skill("Handling", Some(12), &[fx.mouse]);
    let training = sqlite::insert_external_training(
        fx.db.conn(),
        fx.alice,
        None,
        date(2024, 1, 5),
        &[EvidenceClaim {
            skill_id: handling,
            level: Level::Novice,
            contexts: ContextSet::from_ids([fx.mouse]),
            practice_date: None,
            wants_tutor: false,
        }],
    )
    .unwrap();

    let outcome = Reconciler::new(&mut fx.db)
        .approve_external_training(training, fx.validator)
        .unwrap();
    let comp = sqlite::get_competency(fx.db.conn(), outcome.updated_competencies[0]).unwrap();
    assert_eq!(comp.evaluator, Some(Evaluator::internal(fx.validator)));
}

#[test]
fn approval_emits_practice_events_and_tutor_membership() {
    let mut fx = Fixture::new();
    let handling = fx.skill("Handling", Some(12), &[fx.mouse]);
    let training = sqlite::insert_external_training(
        fx.db.conn(),
        fx.alice,
        Some("Acme"),
        date(2024, 1, 5),
        &[EvidenceClaim {
            skill_id: handling,
            level: Level::Novice,
            contexts: ContextSet::from_ids([fx.mouse]),
            practice_date: Some(date(2023, 12, 1)),
            wants_tutor: true,
        }],
    )
    .unwrap();

    let outcome = Reconciler::new(&mut fx.db)
        .approve_external_training(training, fx.validator)
        .unwrap();
    assert_eq!(outcome.new_practice_events.len(), 1);
    assert_eq!(outcome.tutor_additions, vec![handling]);
    assert!(sqlite::is_tutor(fx.db.conn(), handling, fx.alice).unwrap());
    assert!(
        sqlite::practice_event_exists(fx.db.conn(), fx.alice, date(2023, 12, 1), handling)
            .unwrap()
    );
}

#[test]
fn second_approval_is_a_soft_no_op() {
    let mut fx = Fixture::new();
    let handling = fx.skill("Handling", Some(12), &[fx.mouse]);
    let training = sqlite::insert_external_training(
        fx.db.conn(),
        fx.alice,
        Some("Acme"),
        date(2024, 1, 5),
        &[EvidenceClaim {
            skill_id: handling,
            level: Level::Novice,
            contexts: ContextSet::from_ids([fx.mouse]),
            practice_date: None,
            wants_tutor: false,
        }],
    )
    .unwrap();

    Reconciler::new(&mut fx.db)
        .approve_external_training(training, fx.validator)
        .unwrap();
    let before = sqlite::all_competencies(fx.db.conn()).unwrap().len();

    let outcome = Reconciler::new(&mut fx.db)
        .approve_external_training(training, fx.validator)
        .unwrap();
    assert!(outcome.already_terminal);
    assert!(outcome.updated_competencies.is_empty());
    assert_eq!(sqlite::all_competencies(fx.db.conn()).unwrap().len(), before);
}

#[test]
fn rejection_changes_status_only() {
    let mut fx = Fixture::new();
    let handling = fx.skill("Handling", Some(12), &[fx.mouse]);
    let training = sqlite::insert_external_training(
        fx.db.conn(),
        fx.alice,
        Some("Acme"),
        date(2024, 1, 5),
        &[EvidenceClaim {
            skill_id: handling,
            level: Level::Novice,
            contexts: ContextSet::from_ids([fx.mouse]),
            practice_date: None,
            wants_tutor: true,
        }],
    )
    .unwrap();

    let applied = Reconciler::new(&mut fx.db)
        .reject_external_training(training, fx.validator)
        .unwrap();
    assert!(applied);
    assert!(sqlite::all_competencies(fx.db.conn()).unwrap().is_empty());
    assert!(!sqlite::is_tutor(fx.db.conn(), handling, fx.alice).unwrap());

    let stored = sqlite::get_external_training(fx.db.conn(), training).unwrap();
    assert_eq!(stored.status, ExternalTrainingStatus::Rejected);
    assert_eq!(stored.validator_id, Some(fx.validator));

    // Terminal: neither a second rejection nor an approval applies.
    let applied = Reconciler::new(&mut fx.db)
        .reject_external_training(training, fx.validator)
        .unwrap();
    assert!(!applied);
    let outcome = Reconciler::new(&mut fx.db)
        .approve_external_training(training, fx.validator)
        .unwrap();
    assert!(outcome.already_terminal);
}

#[test]
fn claim_outside_skill_contexts_is_invalid_evidence() {
    let mut fx = Fixture::new();
    let handling = fx.skill("Handling", Some(12), &[fx.mouse]);
    let training = sqlite::insert_external_training(
        fx.db.conn(),
        fx.alice,
        Some("Acme"),
        date(2024, 1, 5),
        &[EvidenceClaim {
            skill_id: handling,
            level: Level::Novice,
            contexts: ContextSet::from_ids([fx.zebrafish]),
            practice_date: None,
            wants_tutor: false,
        }],
    )
    .unwrap();

    let err = Reconciler::new(&mut fx.db)
        .approve_external_training(training, fx.validator)
        .unwrap_err();
    assert!(matches!(err, RecertError::InvalidEvidence(_)));

    // Nothing was written: the record is still pending.
    let stored = sqlite::get_external_training(fx.db.conn(), training).unwrap();
    assert_eq!(stored.status, ExternalTrainingStatus::Pending);
    assert!(sqlite::all_competencies(fx.db.conn()).unwrap().is_empty());
}

// =============================================================================
// SELF-DECLARED PRACTICE PATH
// =============================================================================

fn evaluated_competency(fx: &mut Fixture, skill: i64, level: Level) -> i64 {
    let session = fx.session(fx.validator, &[fx.alice], &[skill]);
    let outcome = Reconciler::new(&mut fx.db)
        .validate_session(
            session,
            fx.validator,
            &[SessionSubmission {
                attendee_id: fx.alice,
                skill_id: skill,
                level,
            }],
            date(2024, 1, 11),
        )
        .unwrap();
    outcome.updated_competencies[0]
}

#[test]
fn duplicate_practice_declaration_creates_one_event() {
    let mut fx = Fixture::new();
    let handling = fx.skill("Handling", Some(12), &[fx.mouse]);
    let competency = evaluated_competency(&mut fx, handling, Level::Novice);

    let item = PracticeItem {
        competency_id: competency,
        level: None,
        practice_date: Some(date(2024, 2, 1)),
        tutor_intent: None,
    };

    let first = Reconciler::new(&mut fx.db)
        .declare_practice(fx.alice, std::slice::from_ref(&item))
        .unwrap();
    assert_eq!(first.new_practice_events.len(), 1);
    assert_eq!(first.duplicate_practice_skipped, 0);

    let second = Reconciler::new(&mut fx.db)
        .declare_practice(fx.alice, &[item])
        .unwrap();
    assert!(second.new_practice_events.is_empty());
    assert_eq!(second.duplicate_practice_skipped, 1);

    let dates = sqlite::practice_dates_for(fx.db.conn(), fx.alice, handling).unwrap();
    assert_eq!(dates.len(), 1);
}

#[test]
fn practice_level_change_applies_only_when_different() {
    let mut fx = Fixture::new();
    let handling = fx.skill("Handling", Some(12), &[fx.mouse]);
    let competency = evaluated_competency(&mut fx, handling, Level::Novice);

    let outcome = Reconciler::new(&mut fx.db)
        .declare_practice(
            fx.alice,
            &[PracticeItem {
                competency_id: competency,
                level: Some(Level::Novice),
                practice_date: None,
                tutor_intent: None,
            }],
        )
        .unwrap();
    assert!(outcome.updated_competencies.is_empty());

    let outcome = Reconciler::new(&mut fx.db)
        .declare_practice(
            fx.alice,
            &[PracticeItem {
                competency_id: competency,
                level: Some(Level::Expert),
                practice_date: None,
                tutor_intent: None,
            }],
        )
        .unwrap();
    assert_eq!(outcome.updated_competencies, vec![competency]);
    assert_eq!(
        sqlite::get_competency(fx.db.conn(), competency).unwrap().level,
        Level::Expert
    );
}

#[test]
fn practice_tutor_intent_adds_and_removes() {
    let mut fx = Fixture::new();
    let handling = fx.skill("Handling", Some(12), &[fx.mouse]);
    let competency = evaluated_competency(&mut fx, handling, Level::Novice);

    let join = PracticeItem {
        competency_id: competency,
        level: None,
        practice_date: None,
        tutor_intent: Some(true),
    };
    let outcome = Reconciler::new(&mut fx.db)
        .declare_practice(fx.alice, std::slice::from_ref(&join))
        .unwrap();
    assert_eq!(outcome.tutor_added, vec![handling]);

    // Idempotent: joining again changes nothing.
    let outcome = Reconciler::new(&mut fx.db)
        .declare_practice(fx.alice, &[join])
        .unwrap();
    assert!(outcome.tutor_added.is_empty());

    let leave = PracticeItem {
        competency_id: competency,
        level: None,
        practice_date: None,
        tutor_intent: Some(false),
    };
    let outcome = Reconciler::new(&mut fx.db)
        .declare_practice(fx.alice, &[leave])
        .unwrap();
    assert_eq!(outcome.tutor_removed, vec![handling]);
    assert!(!sqlite::is_tutor(fx.db.conn(), handling, fx.alice).unwrap());
}

#[test]
fn practice_batch_rejects_foreign_competencies_atomically() {
    let mut fx = Fixture::new();
    let handling = fx.skill("Handling", Some(12), &[fx.mouse]);
    let alices = evaluated_competency(&mut fx, handling, Level::Novice);

    // Bob gets his own competency in the same skill.
    let session = fx.session(fx.validator, &[fx.bob], &[handling]);
    let bobs = Reconciler::new(&mut fx.db)
        .validate_session(
            session,
            fx.validator,
            &[SessionSubmission {
                attendee_id: fx.bob,
                skill_id: handling,
                level: Level::Novice,
            }],
            date(2024, 1, 11),
        )
        .unwrap()
        .updated_competencies[0];

    let err = Reconciler::new(&mut fx.db)
        .declare_practice(
            fx.alice,
            &[
                PracticeItem {
                    competency_id: alices,
                    level: Some(Level::Expert),
                    practice_date: Some(date(2024, 2, 1)),
                    tutor_intent: None,
                },
                PracticeItem {
                    competency_id: bobs,
                    level: Some(Level::Expert),
                    practice_date: None,
                    tutor_intent: None,
                },
            ],
        )
        .unwrap_err();
    assert!(matches!(err, RecertError::Unauthorized(_)));

    // The valid first item must not have been applied either.
    assert_eq!(
        sqlite::get_competency(fx.db.conn(), alices).unwrap().level,
        Level::Novice
    );
    assert!(
        sqlite::practice_dates_for(fx.db.conn(), fx.alice, handling)
            .unwrap()
            .is_empty()
    );
}

#[test]
fn practice_for_unknown_competency_is_not_found() {
    let mut fx = Fixture::new();
    let err = Reconciler::new(&mut fx.db)
        .declare_practice(
            fx.alice,
            &[PracticeItem {
                competency_id: 424_242,
                level: None,
                practice_date: None,
                tutor_intent: None,
            }],
        )
        .unwrap_err();
    assert!(matches!(err, RecertError::CompetencyNotFound(424_242)));
}
