//! External-training approval path.
//!
//! On approval, every claim attached to the training becomes competency
//! evidence using the claim's own declared context-set, which may differ
//! from the skill's default contexts. Rejection only changes the record's
//! status.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::{Evaluator, ExternalTrainingStatus};
use crate::error::{RecertError, Result};
use crate::storage::{sqlite, CompetencyWrite};

use super::update_or_create;

/// Result of an external-training approval.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExternalApprovalOutcome {
    /// Competency ids written by this approval (updated or created)
    pub updated_competencies: Vec<i64>,
    /// Practice event ids created from claim practice dates
    pub new_practice_events: Vec<i64>,
    /// (skill, user) roster memberships newly created
    pub tutor_additions: Vec<i64>,
    /// True when the record was already approved or rejected; nothing
    /// was mutated
    pub already_terminal: bool,
}

pub(super) fn approve(
    conn: &Connection,
    training_id: i64,
    validator_id: i64,
) -> Result<ExternalApprovalOutcome> {
    let training = sqlite::get_external_training(conn, training_id)?;
    sqlite::get_user(conn, validator_id)?;

    if training.status.is_terminal() {
        warn!(
            training_id,
            status = training.status.as_str(),
            "approval of terminal external training skipped"
        );
        return Ok(ExternalApprovalOutcome {
            already_terminal: true,
            ..ExternalApprovalOutcome::default()
        });
    }

    // Whole-batch validation before any write: every claimed skill must
    // exist and every claimed context must belong to it.
    for claim in &training.claims {
        let skill = sqlite::get_skill(conn, claim.skill_id)?;
        if !claim.contexts.is_subset_of(&skill.contexts) {
            return Err(RecertError::InvalidEvidence(format!(
                "claim on skill {} names contexts {} outside the skill's {}",
                claim.skill_id, claim.contexts, skill.contexts
            )));
        }
    }

    sqlite::set_external_training_status(
        conn,
        training_id,
        ExternalTrainingStatus::Approved,
        validator_id,
    )?;

    let evaluator = match &training.trainer_name {
        Some(name) => Evaluator::external(name.clone()),
        None => Evaluator::internal(validator_id),
    };

    let mut outcome = ExternalApprovalOutcome::default();
    for claim in &training.claims {
        let write = CompetencyWrite {
            level: claim.level,
            evaluation_date: Some(training.date),
            evaluator: Some(evaluator.clone()),
            session_id: None,
            external_training_id: Some(training_id),
        };
        let (competency_id, _) = update_or_create(
            conn,
            training.user_id,
            claim.skill_id,
            &claim.contexts,
            &write,
        )?;
        outcome.updated_competencies.push(competency_id);

        if let Some(practice_date) = claim.practice_date {
            // Duplicate events for the same (user, date, skill) are
            // absorbed silently.
            if !sqlite::practice_event_exists(conn, training.user_id, practice_date, claim.skill_id)? {
                let event_id = sqlite::insert_practice_event(
                    conn,
                    training.user_id,
                    practice_date,
                    &[claim.skill_id],
                    "Declared with external training",
                )?;
                outcome.new_practice_events.push(event_id);
            }
        }

        if claim.wants_tutor && sqlite::add_tutor(conn, claim.skill_id, training.user_id)? {
            outcome.tutor_additions.push(claim.skill_id);
        }
    }

    info!(
        training_id,
        validator_id,
        competencies = outcome.updated_competencies.len(),
        practice_events = outcome.new_practice_events.len(),
        "external training approved"
    );

    Ok(outcome)
}

/// Reject a pending external training. Returns false (and leaves the
/// record untouched) when the status is already terminal.
pub(super) fn reject(conn: &Connection, training_id: i64, validator_id: i64) -> Result<bool> {
    let training = sqlite::get_external_training(conn, training_id)?;
    sqlite::get_user(conn, validator_id)?;

    if training.status.is_terminal() {
        warn!(
            training_id,
            status = training.status.as_str(),
            "rejection of terminal external training skipped"
        );
        return Ok(false);
    }

    sqlite::set_external_training_status(
        conn,
        training_id,
        ExternalTrainingStatus::Rejected,
        validator_id,
    )?;
    info!(training_id, validator_id, "external training rejected");
    Ok(true)
}
