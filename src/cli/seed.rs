//! Demo data seeding.
//!
//! Builds a small, deterministic data set and pushes it through the real
//! reconciliation paths, so seeded competencies look exactly like
//! production ones.

use chrono::{Duration, Utc};
use serde::Serialize;
use tracing::info;

use crate::core::{Complexity, ContextSet, DeliveryMode, EvidenceClaim, Level, SessionSubmission};
use crate::error::Result;
use crate::reconcile::Reconciler;
use crate::storage::{sqlite, Database};

/// What the seed created.
#[derive(Debug, Clone, Serialize)]
pub struct SeedSummary {
    pub users: usize,
    pub contexts: usize,
    pub skills: usize,
    pub sessions: usize,
    pub external_trainings: usize,
    pub continuous_training_events: usize,
}

impl SeedSummary {
    pub fn describe(&self) -> String {
        format!(
            "Seeded {} users, {} contexts, {} skills, {} session, {} external training, {} CE events",
            self.users,
            self.contexts,
            self.skills,
            self.sessions,
            self.external_trainings,
            self.continuous_training_events
        )
    }
}

/// Populate the database with demo data.
pub fn run(db: &mut Database) -> Result<SeedSummary> {
    let now = Utc::now();

    let (zebrafish, validator, alice, bob, handling, anesthesia, welfare) = {
        let conn = db.conn();

        let mouse = sqlite::insert_context(conn, "Mouse")?;
        let rat = sqlite::insert_context(conn, "Rat")?;
        let zebrafish = sqlite::insert_context(conn, "Zebrafish")?;

        let validator = sqlite::insert_user(conn, "Valerie Durand", "valerie@example.org", true)?;
        let alice = sqlite::insert_user(conn, "Alice Martin", "alice@example.org", false)?;
        let bob = sqlite::insert_user(conn, "Bob Leroy", "bob@example.org", false)?;

        let handling = sqlite::insert_skill(
            conn,
            "Animal handling",
            "Restraint and daily handling",
            Complexity::Simple,
            Some(12),
            &ContextSet::from_ids([mouse, rat]),
        )?;
        let anesthesia = sqlite::insert_skill(
            conn,
            "Gas anesthesia",
            "Induction and monitoring",
            Complexity::Complex,
            Some(24),
            &ContextSet::from_ids([mouse, rat, zebrafish]),
        )?;
        let welfare = sqlite::insert_skill(
            conn,
            "Welfare assessment",
            "Scoring sheets and humane endpoints",
            Complexity::Moderate,
            None,
            &ContextSet::empty(),
        )?;

        sqlite::add_tutor(conn, handling, validator)?;
        (zebrafish, validator, alice, bob, handling, anesthesia, welfare)
    };

    // An internal session, validated through the session path.
    let session_id = sqlite::insert_session(
        db.conn(),
        "Induction week",
        "Room B12",
        now - Duration::days(30),
        now - Duration::days(29),
        Some(validator),
        &[alice, bob],
        &[handling, welfare],
    )?;
    let mut reconciler = Reconciler::new(db);
    reconciler.validate_session(
        session_id,
        validator,
        &[
            SessionSubmission {
                attendee_id: alice,
                skill_id: handling,
                level: Level::Intermediate,
            },
            SessionSubmission {
                attendee_id: alice,
                skill_id: welfare,
                level: Level::Novice,
            },
            SessionSubmission {
                attendee_id: bob,
                skill_id: handling,
                level: Level::Novice,
            },
        ],
        now - Duration::days(29),
    )?;

    // An approved external training with a zebrafish-only claim.
    let training_id = sqlite::insert_external_training(
        db.conn(),
        alice,
        Some("Aquatic Facility Courses"),
        now - Duration::days(400),
        &[EvidenceClaim {
            skill_id: anesthesia,
            level: Level::Expert,
            contexts: ContextSet::from_ids([zebrafish]),
            practice_date: Some(now - Duration::days(200)),
            wants_tutor: true,
        }],
    )?;
    let mut reconciler = Reconciler::new(db);
    reconciler.approve_external_training(training_id, validator)?;

    // Continuing-education events across the window, one still pending.
    let conn = db.conn();
    let congress = sqlite::insert_ct_event(
        conn,
        "Lab animal science congress",
        now - Duration::days(300),
        DeliveryMode::Live,
        14.0,
    )?;
    let webinar = sqlite::insert_ct_event(
        conn,
        "Refinement webinar",
        now - Duration::days(120),
        DeliveryMode::Online,
        3.5,
    )?;
    let workshop = sqlite::insert_ct_event(
        conn,
        "Ethics workshop",
        now - Duration::days(10),
        DeliveryMode::Live,
        7.0,
    )?;

    let record = sqlite::submit_attendance(conn, alice, congress)?;
    sqlite::approve_attendance(conn, record, None)?;
    let record = sqlite::submit_attendance(conn, alice, webinar)?;
    sqlite::approve_attendance(conn, record, Some(3.0))?;
    sqlite::submit_attendance(conn, alice, workshop)?;
    let record = sqlite::submit_attendance(conn, bob, webinar)?;
    sqlite::approve_attendance(conn, record, None)?;

    info!("seed data created");
    Ok(SeedSummary {
        users: 3,
        contexts: 3,
        skills: 3,
        sessions: 1,
        external_trainings: 1,
        continuous_training_events: 3,
    })
}
