//! Self-declared practice path.
//!
//! A user maintains their own competencies: declaring recent practice,
//! adjusting levels, and opting in or out of tutoring. The batch is
//! restricted to the acting user's records and applies all-or-nothing.

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::{Competency, Level};
use crate::error::{RecertError, Result};
use crate::storage::sqlite;

/// One line of a self-declared practice batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PracticeItem {
    /// The user's own competency being maintained
    pub competency_id: i64,
    /// New level; only applied when provided and different
    pub level: Option<Level>,
    /// Practice date to record; deduplicated on (user, date, skill)
    pub practice_date: Option<DateTime<Utc>>,
    /// Tutor intent: `Some(true)` joins the roster, `Some(false)` leaves
    /// it, `None` leaves membership untouched. This is the only path
    /// supporting removal.
    pub tutor_intent: Option<bool>,
}

/// Result of a self-declared practice batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PracticeOutcome {
    /// Competency ids whose level changed
    pub updated_competencies: Vec<i64>,
    /// Practice event ids created
    pub new_practice_events: Vec<i64>,
    /// Skill ids the user newly tutors
    pub tutor_added: Vec<i64>,
    /// Skill ids the user stopped tutoring
    pub tutor_removed: Vec<i64>,
    /// Practice declarations skipped by the idempotency check
    pub duplicate_practice_skipped: u32,
}

pub(super) fn declare(
    conn: &Connection,
    user_id: i64,
    items: &[PracticeItem],
) -> Result<PracticeOutcome> {
    sqlite::get_user(conn, user_id)?;

    // Ownership and existence checks for the whole batch before any
    // write.
    let mut resolved: Vec<(&PracticeItem, Competency)> = Vec::with_capacity(items.len());
    for item in items {
        let competency = sqlite::get_competency(conn, item.competency_id)?;
        if competency.user_id != user_id {
            return Err(RecertError::Unauthorized(format!(
                "competency {} does not belong to user {user_id}",
                item.competency_id
            )));
        }
        resolved.push((item, competency));
    }

    let mut outcome = PracticeOutcome::default();
    for (item, competency) in resolved {
        if let Some(level) = item.level {
            if level != competency.level {
                sqlite::update_competency_level(conn, competency.id, level)?;
                outcome.updated_competencies.push(competency.id);
            }
        }

        if let Some(practice_date) = item.practice_date {
            if sqlite::practice_event_exists(conn, user_id, practice_date, competency.skill_id)? {
                outcome.duplicate_practice_skipped += 1;
            } else {
                let skill = sqlite::get_skill(conn, competency.skill_id)?;
                let event_id = sqlite::insert_practice_event(
                    conn,
                    user_id,
                    practice_date,
                    &[competency.skill_id],
                    &format!("Self-declared practice of {}", skill.name),
                )?;
                outcome.new_practice_events.push(event_id);
            }
        }

        match item.tutor_intent {
            Some(true) => {
                if sqlite::add_tutor(conn, competency.skill_id, user_id)? {
                    outcome.tutor_added.push(competency.skill_id);
                }
            }
            Some(false) => {
                if sqlite::remove_tutor(conn, competency.skill_id, user_id)? {
                    outcome.tutor_removed.push(competency.skill_id);
                }
            }
            None => {}
        }
    }

    info!(
        user_id,
        items = items.len(),
        level_changes = outcome.updated_competencies.len(),
        practice_events = outcome.new_practice_events.len(),
        duplicates = outcome.duplicate_practice_skipped,
        "self-declared practice applied"
    );

    Ok(outcome)
}
