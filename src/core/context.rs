//! Normalized context-set representation.
//!
//! A competency applies to a set of contexts (species in the reference
//! domain). Matching competencies against incoming evidence compares these
//! sets by equality, never by order or containment. Every comparison site
//! goes through [`ContextSet`] so the normalization rule lives in one place.

use serde::{Deserialize, Serialize};

/// A context entity (species) a skill or competency applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    /// Unique context ID
    pub id: i64,
    /// Human-readable name
    pub name: String,
}

/// An order-independent set of context ids.
///
/// Ids are kept sorted and deduplicated, so two sets built from any
/// orderings of the same ids compare equal with plain `==`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextSet(Vec<i64>);

impl ContextSet {
    /// Create an empty context set.
    #[must_use]
    pub const fn empty() -> Self {
        Self(Vec::new())
    }

    /// Build a normalized set from ids in any order, duplicates allowed.
    #[must_use]
    pub fn from_ids(ids: impl IntoIterator<Item = i64>) -> Self {
        let mut ids: Vec<i64> = ids.into_iter().collect();
        ids.sort_unstable();
        ids.dedup();
        Self(ids)
    }

    /// The sorted ids of this set.
    #[must_use]
    pub fn ids(&self) -> &[i64] {
        &self.0
    }

    /// Number of contexts in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `id` is a member of this set.
    #[must_use]
    pub fn contains(&self, id: i64) -> bool {
        self.0.binary_search(&id).is_ok()
    }

    /// Whether every id in this set is also in `other`.
    #[must_use]
    pub fn is_subset_of(&self, other: &Self) -> bool {
        self.0.iter().all(|id| other.contains(*id))
    }

    /// Set equality. Identical to `==`; named for call sites where the
    /// comparison rule matters more than the operator.
    #[must_use]
    pub fn same_contexts(&self, other: &Self) -> bool {
        self == other
    }

    /// Iterate the sorted ids.
    pub fn iter(&self) -> impl Iterator<Item = i64> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<i64> for ContextSet {
    fn from_iter<T: IntoIterator<Item = i64>>(iter: T) -> Self {
        Self::from_ids(iter)
    }
}

impl std::fmt::Display for ContextSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, id) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{id}")?;
        }
        write!(f, "}}")
    }
}
