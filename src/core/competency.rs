//! Canonical competency records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::context::ContextSet;
use crate::core::skill::Level;

/// Who evaluated a competency.
///
/// A competency is signed off either by an internal evaluator (a user of
/// the system) or by a named external trainer, never both. The tagged
/// union makes the mutual exclusion structural: updating a record with a
/// new evaluator replaces the whole value, implicitly clearing the other
/// designation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Evaluator {
    /// Internal evaluator, referenced by user id
    Internal { user_id: i64 },
    /// External trainer, referenced by name only
    External { name: String },
}

impl Evaluator {
    /// Internal evaluator constructor.
    #[must_use]
    pub const fn internal(user_id: i64) -> Self {
        Self::Internal { user_id }
    }

    /// External evaluator constructor.
    #[must_use]
    pub fn external(name: impl Into<String>) -> Self {
        Self::External { name: name.into() }
    }
}

/// The canonical statement "user U is certified in skill S, at level L,
/// for context-set C, as of evaluation date E".
///
/// Invariant: for a given (user, skill) pair, records have pairwise
/// distinct context-sets. Evidence whose context-set equals an existing
/// record's set updates that record in place instead of creating a new
/// one. Only the reconciler writes this type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Competency {
    /// Unique competency ID
    pub id: i64,
    /// Certified user
    pub user_id: i64,
    /// Certified skill
    pub skill_id: i64,
    /// Proficiency level
    pub level: Level,
    /// Evaluation date; `None` until an evaluator signs off
    pub evaluation_date: Option<DateTime<Utc>>,
    /// Internal or external evaluator designation
    pub evaluator: Option<Evaluator>,
    /// Originating training session, if any
    pub session_id: Option<i64>,
    /// Originating external training, if any
    pub external_training_id: Option<i64>,
    /// Contexts this certification applies to
    pub contexts: ContextSet,
}

/// A timestamped self-declaration that a user practiced one or more
/// skills, independent of formal evaluation. Extends (never shortens) the
/// effective last-evidence date of matching competencies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PracticeEvent {
    /// Unique event ID
    pub id: i64,
    /// Practicing user
    pub user_id: i64,
    /// Date of practice
    pub practice_date: DateTime<Utc>,
    /// Skills practiced
    pub skill_ids: Vec<i64>,
    /// Free-form notes
    pub notes: String,
}
