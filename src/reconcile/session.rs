//! Session validation path.
//!
//! A tutor (or a user with the global validator role) validates which
//! attendees acquired which covered skills. Authorization is scoped per
//! skill: tutoring one covered skill does not authorize validating the
//! others.

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::{Evaluator, SessionSubmission};
use crate::error::{RecertError, Result};
use crate::storage::{sqlite, CompetencyWrite};

use super::update_or_create;

/// Result of a session validation batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionValidationOutcome {
    /// Competency ids written by this batch (updated or created)
    pub updated_competencies: Vec<i64>,
    /// Whether the session is Realized after this batch
    pub session_now_realized: bool,
}

pub(super) fn validate(
    conn: &Connection,
    session_id: i64,
    validator_id: i64,
    submissions: &[SessionSubmission],
    as_of: DateTime<Utc>,
) -> Result<SessionValidationOutcome> {
    let session = sqlite::get_session(conn, session_id)?;
    let validator = sqlite::get_user(conn, validator_id)?;

    // Whole-batch validation before any write.
    for submission in submissions {
        if !session.attendee_ids.contains(&submission.attendee_id) {
            return Err(RecertError::InvalidEvidence(format!(
                "user {} is not an attendee of session {session_id}",
                submission.attendee_id
            )));
        }
        if !session.skill_ids.contains(&submission.skill_id) {
            return Err(RecertError::InvalidEvidence(format!(
                "skill {} is not covered by session {session_id}",
                submission.skill_id
            )));
        }
        if !validator.is_validator && !sqlite::is_tutor(conn, submission.skill_id, validator_id)? {
            return Err(RecertError::Unauthorized(format!(
                "user {validator_id} cannot validate skill {} in session {session_id}",
                submission.skill_id
            )));
        }
    }

    let mut updated_competencies = Vec::with_capacity(submissions.len());
    for submission in submissions {
        let skill = sqlite::get_skill(conn, submission.skill_id)?;
        let write = CompetencyWrite {
            level: submission.level,
            evaluation_date: Some(as_of),
            evaluator: Some(Evaluator::internal(validator_id)),
            session_id: Some(session_id),
            external_training_id: None,
        };
        let (competency_id, _) = update_or_create(
            conn,
            submission.attendee_id,
            submission.skill_id,
            &skill.contexts,
            &write,
        )?;
        updated_competencies.push(competency_id);
    }

    let session_now_realized = refresh_realized(conn, session_id)?;

    info!(
        session_id,
        validator_id,
        submissions = submissions.len(),
        realized = session_now_realized,
        "session validation applied"
    );

    Ok(SessionValidationOutcome {
        updated_competencies,
        session_now_realized,
    })
}

/// Recompute the Realized flag: every (attendee, covered skill) pair must
/// hold a competency with a non-null evaluation date. Idempotent: a
/// session already realized stays realized.
fn refresh_realized(conn: &Connection, session_id: i64) -> Result<bool> {
    let session = sqlite::get_session(conn, session_id)?;
    if session.realized {
        return Ok(true);
    }

    for attendee_id in &session.attendee_ids {
        for skill_id in &session.skill_ids {
            let evaluated = sqlite::competencies_for(conn, *attendee_id, *skill_id)?
                .iter()
                .any(|comp| comp.evaluation_date.is_some());
            if !evaluated {
                return Ok(false);
            }
        }
    }

    sqlite::set_session_realized(conn, session_id, true)?;
    Ok(true)
}
