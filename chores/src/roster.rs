//! The household roster and per-chore rotation orderings.
//!
//! The roster is the ordered list of residents. A chore may carry an
//! override ordering (single residents or fixed pairs) that is used
//! instead of the roster order when rotating that chore.

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

use chores_proto::resident::{Assignee, Resident};
use chores_proto::task::{TaskDefinition, TaskTitle};

/// Error type for roster construction and validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RosterError {
    /// The roster has no residents.
    #[error("roster has no residents")]
    Empty,
    /// The same resident appears twice (case-insensitive).
    #[error("duplicate resident: {0}")]
    DuplicateResident(String),
    /// An override ordering has no entries.
    #[error("override ordering for '{0}' is empty")]
    EmptyOverride(TaskTitle),
    /// An override names someone who is not on the roster.
    #[error("override ordering for '{title}' names unknown resident '{name}'")]
    UnknownResident {
        /// Chore whose ordering is invalid.
        title: TaskTitle,
        /// The unknown name.
        name: String,
    },
    /// A pair lists the same resident twice.
    #[error("override ordering for '{title}' pairs '{name}' with themselves")]
    SelfPair {
        /// Chore whose ordering is invalid.
        title: TaskTitle,
        /// The repeated name.
        name: String,
    },
    /// An override mixes single residents and pairs.
    #[error("override ordering for '{0}' mixes singles and pairs")]
    MixedOverride(TaskTitle),
    /// A pair chore has no ordering made of pairs.
    #[error("'{0}' requires a pair ordering")]
    PairOrderingRequired(TaskTitle),
    /// A single-person chore has an ordering made of pairs.
    #[error("'{0}' is a single-person chore but its ordering lists pairs")]
    SingleOrderingRequired(TaskTitle),
}

/// Residents plus per-chore override orderings. Read-only once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roster {
    residents: Vec<Resident>,
    overrides: HashMap<TaskTitle, Vec<Assignee>>,
}

impl Roster {
    /// Builds a roster from an ordered list of residents.
    ///
    /// # Errors
    ///
    /// Returns `RosterError::Empty` for an empty list or
    /// `RosterError::DuplicateResident` if a name repeats.
    pub fn new(residents: Vec<Resident>) -> Result<Self, RosterError> {
        if residents.is_empty() {
            return Err(RosterError::Empty);
        }
        let mut seen = HashSet::new();
        for resident in &residents {
            if !seen.insert(resident) {
                return Err(RosterError::DuplicateResident(resident.to_string()));
            }
        }
        Ok(Self {
            residents,
            overrides: HashMap::new(),
        })
    }

    /// Adds (or replaces) the override ordering for a chore.
    ///
    /// # Errors
    ///
    /// Returns a `RosterError` if the ordering is empty, mixes singles and
    /// pairs, pairs a resident with themselves, or names someone who is not
    /// on the roster.
    pub fn with_override(
        mut self,
        title: TaskTitle,
        ordering: Vec<Assignee>,
    ) -> Result<Self, RosterError> {
        let first = ordering.first().ok_or(RosterError::EmptyOverride(title))?;
        let pairs = first.is_pair();
        for entry in &ordering {
            if entry.is_pair() != pairs {
                return Err(RosterError::MixedOverride(title));
            }
            if let Assignee::Pair(a, b) = entry {
                if a == b {
                    return Err(RosterError::SelfPair {
                        title,
                        name: a.to_string(),
                    });
                }
            }
            for member in entry.members() {
                if !self.contains(member.as_str()) {
                    return Err(RosterError::UnknownResident {
                        title,
                        name: member.to_string(),
                    });
                }
            }
        }
        self.overrides.insert(title, ordering);
        Ok(self)
    }

    /// Residents in roster order.
    #[must_use]
    pub fn residents(&self) -> &[Resident] {
        &self.residents
    }

    /// Whether `name` is on the roster (case-insensitive).
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.residents.iter().any(|r| r.matches(name))
    }

    /// The override ordering for a chore, if one was configured.
    #[must_use]
    pub fn override_for(&self, title: TaskTitle) -> Option<&[Assignee]> {
        self.overrides.get(&title).map(Vec::as_slice)
    }

    /// The ordering a chore rotates through: its override, or every
    /// resident as a single assignee in roster order.
    #[must_use]
    pub fn ordering_for(&self, title: TaskTitle) -> Cow<'_, [Assignee]> {
        self.override_for(title).map_or_else(
            || {
                Cow::Owned(
                    self.residents
                        .iter()
                        .cloned()
                        .map(Assignee::Single)
                        .collect(),
                )
            },
            Cow::Borrowed,
        )
    }

    /// Checks that every definition has a usable ordering.
    ///
    /// Pair chores need a pair override; single chores must not rotate
    /// through pairs.
    ///
    /// # Errors
    ///
    /// Returns `RosterError::PairOrderingRequired` or
    /// `RosterError::SingleOrderingRequired` for the first mismatch.
    pub fn validate_for(&self, definitions: &[TaskDefinition]) -> Result<(), RosterError> {
        for definition in definitions {
            let pairs = self
                .override_for(definition.title)
                .and_then(<[Assignee]>::first)
                .is_some_and(Assignee::is_pair);
            match (definition.requires_pair, pairs) {
                (true, false) => return Err(RosterError::PairOrderingRequired(definition.title)),
                (false, true) => {
                    return Err(RosterError::SingleOrderingRequired(definition.title));
                }
                _ => {}
            }
        }
        Ok(())
    }
}
