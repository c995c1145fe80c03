//! Assignee selection.
//!
//! Two ways to pick who owns a chore:
//!
//! - **by index**: `ordering[index mod N]`, where the index counts whole
//!   periods since the calendar epoch. Used at initialization and at daily
//!   and weekly rollover.
//! - **by succession**: the entry after the current assignee, wrapping at
//!   the end. Used when a chore is completed and at monthly rollover.
//!
//! A successor lookup that cannot find the current assignee in the ordering
//! is logged and falls back to index selection for the current period.

use chrono::{DateTime, Utc};
use chores_proto::resident::{Assignee, Resident};
use chores_proto::task::{Recurrence, TaskTitle};

use crate::calendar::Calendar;
use crate::roster::Roster;

/// Error type for pure selection over an ordering.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RotationError {
    /// The ordering has no entries.
    #[error("rotation ordering is empty")]
    EmptyOrdering,
    /// The current assignee is not part of the ordering.
    #[error("assignee '{0}' is not in the rotation ordering")]
    AssigneeNotInOrdering(String),
}

/// Picks `ordering[index mod N]`. Negative indices wrap from the end.
///
/// # Errors
///
/// Returns `RotationError::EmptyOrdering` if there is nothing to pick.
pub fn select_by_index(ordering: &[Assignee], index: i64) -> Result<Assignee, RotationError> {
    wrap_index(ordering.len(), index)
        .and_then(|position| ordering.get(position))
        .cloned()
        .ok_or(RotationError::EmptyOrdering)
}

fn wrap_index(len: usize, index: i64) -> Option<usize> {
    let len = i64::try_from(len).ok().filter(|&n| n > 0)?;
    usize::try_from(index.rem_euclid(len)).ok()
}

/// Picks the entry after `current`, wrapping to the start.
///
/// Matching is case-insensitive; a pair matches only the same two members
/// in the same order.
///
/// # Errors
///
/// Returns `RotationError::EmptyOrdering` or
/// `RotationError::AssigneeNotInOrdering`.
pub fn select_successor(ordering: &[Assignee], current: &Assignee) -> Result<Assignee, RotationError> {
    if ordering.is_empty() {
        return Err(RotationError::EmptyOrdering);
    }
    let position = ordering
        .iter()
        .position(|entry| entry == current)
        .ok_or_else(|| RotationError::AssigneeNotInOrdering(current.to_string()))?;
    Ok(ordering[(position + 1) % ordering.len()].clone())
}

/// Selection bound to a roster and calendar.
#[derive(Debug, Clone, Copy)]
pub struct RotationSelector<'a> {
    roster: &'a Roster,
    calendar: &'a Calendar,
}

impl<'a> RotationSelector<'a> {
    /// Creates a selector over `roster` using `calendar` for period indices.
    #[must_use]
    pub const fn new(roster: &'a Roster, calendar: &'a Calendar) -> Self {
        Self { roster, calendar }
    }

    /// Owner of `title` for an explicit period index.
    ///
    /// # Errors
    ///
    /// Returns `RotationError::EmptyOrdering` if the chore has no ordering.
    pub fn by_index(&self, title: TaskTitle, index: i64) -> Result<Assignee, RotationError> {
        select_by_index(&self.roster.ordering_for(title), index)
    }

    /// Owner of `title` for the period of `recurrence` containing `now`.
    ///
    /// # Errors
    ///
    /// Returns `RotationError::EmptyOrdering` if the chore has no ordering.
    pub fn for_period(
        &self,
        title: TaskTitle,
        recurrence: Recurrence,
        now: DateTime<Utc>,
    ) -> Result<Assignee, RotationError> {
        self.by_index(title, self.calendar.period_index(recurrence, now))
    }

    /// The next owner of `title` after `current`.
    ///
    /// If `current` is not in the chore's ordering the anomaly is logged
    /// and the owner for the current period is returned instead.
    ///
    /// # Errors
    ///
    /// Returns `RotationError::EmptyOrdering` if the chore has no ordering.
    pub fn successor(
        &self,
        title: TaskTitle,
        recurrence: Recurrence,
        current: &Assignee,
        now: DateTime<Utc>,
    ) -> Result<Assignee, RotationError> {
        match select_successor(&self.roster.ordering_for(title), current) {
            Ok(next) => Ok(next),
            Err(RotationError::EmptyOrdering) => Err(RotationError::EmptyOrdering),
            Err(err) => {
                tracing::warn!(
                    task = %title,
                    assignee = %current,
                    error = %err,
                    "successor lookup failed, using current period rotation"
                );
                self.for_period(title, recurrence, now)
            }
        }
    }

    /// Resident on duty for the whole-roster daily rotation.
    #[must_use]
    pub fn daily_resident(&self, now: DateTime<Utc>) -> Option<Resident> {
        let residents = self.roster.residents();
        let index = self.calendar.period_index(Recurrence::Daily, now);
        wrap_index(residents.len(), index).and_then(|position| residents.get(position).cloned())
    }
}
