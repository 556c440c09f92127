//! Evidence reconciler.
//!
//! Applies one unit of evidence at a time (a session validation batch,
//! an external-training decision, or a self-declared practice batch),
//! producing competency mutations plus bounded side effects (practice
//! events, tutor roster changes, session realization).
//!
//! Every public operation runs inside a single immediate transaction:
//! the whole batch is validated before any write, and the
//! matcher-then-write sequence cannot interleave with a concurrent
//! reconciliation of the same (user, skill) pair. Partial application of
//! a multi-item payload is impossible by construction.

mod external;
mod practice;
mod session;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::core::{ContextSet, SessionSubmission};
use crate::matcher::{self, MatchOutcome};
use crate::storage::{sqlite, CompetencyWrite, Database};
use crate::error::Result;

pub use external::ExternalApprovalOutcome;
pub use practice::{PracticeItem, PracticeOutcome};
pub use session::SessionValidationOutcome;

/// Orchestrates evidence application against one database.
#[derive(Debug)]
pub struct Reconciler<'a> {
    db: &'a mut Database,
}

impl<'a> Reconciler<'a> {
    /// Create a reconciler over the given database.
    pub fn new(db: &'a mut Database) -> Self {
        Self { db }
    }

    /// Apply a session validation batch: per-skill validator scope,
    /// update-or-create per submission, then Realized recomputation.
    pub fn validate_session(
        &mut self,
        session_id: i64,
        validator_id: i64,
        submissions: &[SessionSubmission],
        as_of: chrono::DateTime<chrono::Utc>,
    ) -> Result<SessionValidationOutcome> {
        let tx = self.db.transaction()?;
        let outcome = session::validate(&tx, session_id, validator_id, submissions, as_of)?;
        tx.commit()?;
        Ok(outcome)
    }

    /// Approve an external training, reconciling all its claims.
    pub fn approve_external_training(
        &mut self,
        training_id: i64,
        validator_id: i64,
    ) -> Result<ExternalApprovalOutcome> {
        let tx = self.db.transaction()?;
        let outcome = external::approve(&tx, training_id, validator_id)?;
        tx.commit()?;
        Ok(outcome)
    }

    /// Reject an external training. Status change only; no competency
    /// mutation. Returns false when the record was already terminal.
    pub fn reject_external_training(
        &mut self,
        training_id: i64,
        validator_id: i64,
    ) -> Result<bool> {
        let tx = self.db.transaction()?;
        let applied = external::reject(&tx, training_id, validator_id)?;
        tx.commit()?;
        Ok(applied)
    }

    /// Apply a self-declared practice batch for the acting user.
    pub fn declare_practice(
        &mut self,
        user_id: i64,
        items: &[PracticeItem],
    ) -> Result<PracticeOutcome> {
        let tx = self.db.transaction()?;
        let outcome = practice::declare(&tx, user_id, items)?;
        tx.commit()?;
        Ok(outcome)
    }
}

/// Which way an update-or-create went, for outcome reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompetencyChange {
    Updated,
    Created,
}

/// Route evidence for one (user, skill) pair through the matcher and
/// write the result: fetch all records of the pair, compare context-sets
/// by equality, update the single match in place or create a new record
/// preserving the non-matching ones.
pub(crate) fn update_or_create(
    conn: &Connection,
    user_id: i64,
    skill_id: i64,
    candidate: &ContextSet,
    write: &CompetencyWrite,
) -> Result<(i64, CompetencyChange)> {
    let existing = sqlite::competencies_for(conn, user_id, skill_id)?;
    match matcher::find_target(&existing, candidate)? {
        MatchOutcome::Existing { competency_id } => {
            sqlite::update_competency(conn, competency_id, write)?;
            tracing::debug!(competency_id, user_id, skill_id, "updated competency in place");
            Ok((competency_id, CompetencyChange::Updated))
        }
        MatchOutcome::CreateNew => {
            let competency_id = sqlite::insert_competency(conn, user_id, skill_id, write, candidate)?;
            tracing::debug!(competency_id, user_id, skill_id, "created competency");
            Ok((competency_id, CompetencyChange::Created))
        }
    }
}
