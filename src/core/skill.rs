//! Skill and user catalog types.

use serde::{Deserialize, Serialize};

use crate::core::context::ContextSet;
use crate::error::{RecertError, Result};

/// Skill complexity rating.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    #[default]
    Simple,
    Moderate,
    Complex,
}

impl Complexity {
    /// Stable string form used by storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Moderate => "moderate",
            Self::Complex => "complex",
        }
    }

    /// Parse the storage string form.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "simple" => Ok(Self::Simple),
            "moderate" => Ok(Self::Moderate),
            "complex" => Ok(Self::Complex),
            other => Err(RecertError::InvalidEvidence(format!(
                "unknown complexity '{other}'"
            ))),
        }
    }
}

/// Proficiency level of a competency, ordered Novice < Intermediate < Expert.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    #[default]
    Novice,
    Intermediate,
    Expert,
}

impl Level {
    /// Stable string form used by storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Novice => "novice",
            Self::Intermediate => "intermediate",
            Self::Expert => "expert",
        }
    }

    /// Parse the storage string form. Unknown values are invalid evidence.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "novice" => Ok(Self::Novice),
            "intermediate" => Ok(Self::Intermediate),
            "expert" => Ok(Self::Expert),
            other => Err(RecertError::InvalidEvidence(format!(
                "unknown level '{other}'"
            ))),
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A practical skill staff must periodically re-certify on.
///
/// Immutable once referenced by competencies except for administrative
/// edits. `validity_period_months` of `None` means the skill never expires.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Skill {
    /// Unique skill ID
    pub id: i64,
    /// Human-readable name
    pub name: String,
    /// Short description
    pub description: String,
    /// Complexity rating
    pub complexity: Complexity,
    /// Validity period in months; `None` means permanently valid
    pub validity_period_months: Option<u32>,
    /// Contexts (species) this skill can be practiced on
    pub contexts: ContextSet,
}

/// A staff member, as consumed from the surrounding application.
///
/// `is_validator` is the global validator role: it authorizes session
/// validation for every covered skill, not just tutored ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user ID
    pub id: i64,
    /// Full display name
    pub full_name: String,
    /// Unique email
    pub email: String,
    /// Global validator role
    pub is_validator: bool,
}
