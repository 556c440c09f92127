//! Competency matcher.
//!
//! Given incoming evidence for a (user, skill) pair, decides whether it
//! updates an existing competency record or requires a new one. The rule
//! is context-set equality: a candidate set equal to a stored record's
//! set targets that record; anything else, subsets and supersets
//! included, creates a new record alongside the existing ones. A user
//! may legitimately hold independent competencies in the same skill for
//! disjoint context-sets (certified on species A but not B).
//!
//! Matching never looks across skills; callers pass only the records of
//! the (user, skill) pair being reconciled.

use serde::{Deserialize, Serialize};

use crate::core::{Competency, ContextSet};
use crate::error::{RecertError, Result};

/// Outcome of matching candidate evidence against existing records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MatchOutcome {
    /// Exactly one record's context-set equals the candidate's; the
    /// reconciler updates it in place.
    Existing { competency_id: i64 },
    /// No record matches; the reconciler creates a new one, preserving
    /// the non-matching records.
    CreateNew,
}

/// Find the target record for a candidate context-set.
///
/// `existing` must be the full set of competency records for one
/// (user, skill) pair. More than one match means the store already holds
/// two records with identical context-sets, which the reconciler must
/// never have allowed; that is reported as [`RecertError::InvariantViolation`]
/// rather than silently picking one.
pub fn find_target(existing: &[Competency], candidate: &ContextSet) -> Result<MatchOutcome> {
    let mut matches = existing
        .iter()
        .filter(|comp| comp.contexts.same_contexts(candidate));

    match (matches.next(), matches.next()) {
        (None, _) => Ok(MatchOutcome::CreateNew),
        (Some(found), None) => Ok(MatchOutcome::Existing {
            competency_id: found.id,
        }),
        (Some(first), Some(second)) => Err(RecertError::InvariantViolation(format!(
            "competencies {} and {} for user {} skill {} share context-set {candidate}",
            first.id, second.id, first.user_id, first.skill_id
        ))),
    }
}
