//! Residents and task assignees.
//!
//! Resident names compare case-insensitively everywhere: the household
//! roster was typed by hand and `"kelvin"` and `"Kelvin"` are the same
//! person. [`Assignee`] is either one resident or an ordered pair.

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// A member of the household roster, identified by name.
///
/// Equality and hashing ignore case; the original spelling is kept for
/// display.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Resident(String);

impl Resident {
    /// Creates a resident from a name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the name as originally spelled.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if `name` refers to this resident (case-insensitive).
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        self.0.to_lowercase() == name.to_lowercase()
    }
}

impl PartialEq for Resident {
    fn eq(&self, other: &Self) -> bool {
        self.matches(&other.0)
    }
}

impl Eq for Resident {}

impl Hash for Resident {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_lowercase().hash(state);
    }
}

impl std::fmt::Display for Resident {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Resident {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Who a task is assigned to.
///
/// Pairs are ordered: `Pair(a, b)` and `Pair(b, a)` are different slots in
/// a rotation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Assignee {
    /// A single resident.
    Single(Resident),
    /// A fixed two-person group.
    Pair(Resident, Resident),
}

impl Assignee {
    /// Shorthand for a single-resident assignee.
    #[must_use]
    pub fn single(name: &str) -> Self {
        Self::Single(Resident::new(name))
    }

    /// Shorthand for a pair assignee.
    #[must_use]
    pub fn pair(first: &str, second: &str) -> Self {
        Self::Pair(Resident::new(first), Resident::new(second))
    }

    /// Returns `true` if `name` is (one of) the assigned resident(s).
    #[must_use]
    pub fn includes(&self, name: &str) -> bool {
        match self {
            Self::Single(r) => r.matches(name),
            Self::Pair(a, b) => a.matches(name) || b.matches(name),
        }
    }

    /// Returns the assigned residents in order.
    #[must_use]
    pub fn members(&self) -> Vec<&Resident> {
        match self {
            Self::Single(r) => vec![r],
            Self::Pair(a, b) => vec![a, b],
        }
    }

    /// Returns `true` for a two-person assignee.
    #[must_use]
    pub const fn is_pair(&self) -> bool {
        matches!(self, Self::Pair(..))
    }
}

impl std::fmt::Display for Assignee {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Single(r) => write!(f, "{r}"),
            Self::Pair(a, b) => write!(f, "{a} & {b}"),
        }
    }
}
