//! The household board: task store, laundry book, rollover checker, and
//! user directory behind a clock, an authorizer, and a persistence
//! collaborator.
//!
//! Every successful mutation saves the whole [`BoardSnapshot`]. A mutation
//! whose save fails is rolled back before the error is returned, so memory
//! never runs ahead of the saved document and a retry applies it again.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use chores_proto::codec::BoardSnapshot;
use chores_proto::laundry::{LaundryReservation, LaundrySlot};
use chores_proto::resident::Resident;
use chores_proto::task::{TaskId, TaskInstance};

use crate::auth::{AuthError, Authorizer, UserDirectory, UserInfo, UserRepository};
use crate::calendar::Calendar;
use crate::clock::Clock;
use crate::laundry::{LaundryBook, LaundryError};
use crate::metrics::{self, MetricsReport};
use crate::persistence::{BoardPersistence, PersistenceError};
use crate::report::{self, MonthlyReport};
use crate::rollover::{RolloverChecker, RolloverReport};
use crate::store::{StoreError, TaskStore, ToggleOutcome};

/// Error type for board operations.
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    /// A task operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// A laundry operation failed.
    #[error(transparent)]
    Laundry(#[from] LaundryError),
    /// A login or password change failed.
    #[error(transparent)]
    Auth(#[from] AuthError),
    /// The board could not be loaded or saved.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// The whole household state and its collaborators.
pub struct Board {
    store: TaskStore,
    laundry: LaundryBook,
    rollover: RolloverChecker,
    users: UserDirectory,
    clock: Arc<dyn Clock>,
    authorizer: Arc<dyn Authorizer>,
    persistence: Arc<dyn BoardPersistence>,
}

impl std::fmt::Debug for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Board")
            .field("tasks", &self.store.tasks().len())
            .field("reservations", &self.laundry.reservations().len())
            .field("last_rollover_check", &self.rollover.last_check())
            .field("users", &self.users.len())
            .finish_non_exhaustive()
    }
}

/// In-memory state captured before a mutation, restored if its save fails.
struct Checkpoint {
    store: TaskStore,
    laundry: LaundryBook,
    rollover: RolloverChecker,
    users: UserDirectory,
}

impl Board {
    /// Opens the board: restores the saved document (or initializes a
    /// fresh one), applies saved passwords over the seeded `users`, catches
    /// up on any rollover missed while it was closed, and saves.
    ///
    /// # Errors
    ///
    /// Returns `BoardError::Persistence` if the document cannot be read or
    /// the initial save fails, or `BoardError::Store` if tasks cannot be
    /// assigned.
    pub fn open(
        mut store: TaskStore,
        mut users: UserDirectory,
        clock: Arc<dyn Clock>,
        authorizer: Arc<dyn Authorizer>,
        persistence: Arc<dyn BoardPersistence>,
    ) -> Result<Self, BoardError> {
        let now = clock.now();
        let (laundry, rollover) = if let Some(snapshot) = persistence.load()? {
            store.restore(snapshot.tasks, snapshot.queued, now)?;
            let applied = users.restore_credentials(snapshot.credentials);
            tracing::debug!(applied, "saved passwords restored");
            (
                LaundryBook::from_reservations(snapshot.reservations),
                RolloverChecker::new(snapshot.last_rollover_check),
            )
        } else {
            tracing::info!("no saved board, starting fresh");
            store.initialize(now)?;
            (LaundryBook::new(), RolloverChecker::default())
        };

        let mut board = Self {
            store,
            laundry,
            rollover,
            users,
            clock,
            authorizer,
            persistence,
        };
        board.rollover.check(&mut board.store, now)?;
        board.save()?;
        Ok(board)
    }

    // --- mutations ---

    /// Completes or reopens a task on behalf of `requester`.
    ///
    /// # Errors
    ///
    /// Returns `BoardError::Store` or `BoardError::Persistence`. Either
    /// way the task is left as it was.
    pub fn toggle(&mut self, id: TaskId, requester: &str) -> Result<ToggleOutcome, BoardError> {
        let now = self.clock.now();
        self.transaction(|board| {
            Ok(board
                .store
                .toggle(id, requester, board.authorizer.as_ref(), now)?)
        })
    }

    /// Runs the rollover checker; saves when a period boundary was crossed.
    ///
    /// # Errors
    ///
    /// Returns `BoardError::Store` if a rollover cannot assign a task, or
    /// `BoardError::Persistence` if the save fails. Either way nothing is
    /// rolled over and the next check tries again.
    pub fn check_rollover(&mut self) -> Result<RolloverReport, BoardError> {
        let now = self.clock.now();
        let checkpoint = self.checkpoint();
        let result = self
            .rollover
            .check(&mut self.store, now)
            .map_err(BoardError::from)
            .and_then(|report| {
                if report.boundaries.any() {
                    self.save()?;
                }
                Ok(report)
            });
        if result.is_err() {
            self.rollback(checkpoint);
        }
        result
    }

    /// Rebuilds every task from its definition as at first start.
    ///
    /// # Errors
    ///
    /// Returns `BoardError::Store` or `BoardError::Persistence`.
    pub fn reset(&mut self) -> Result<(), BoardError> {
        let now = self.clock.now();
        self.transaction(|board| Ok(board.store.reset(now)?))
    }

    /// Books a laundry slot for `resident`.
    ///
    /// # Errors
    ///
    /// Returns `BoardError::Laundry` when a booking rule is broken, or
    /// `BoardError::Persistence`.
    pub fn reserve_laundry(
        &mut self,
        resident: &str,
        date: NaiveDate,
        slot: LaundrySlot,
    ) -> Result<LaundryReservation, BoardError> {
        let today = self.today();
        self.transaction(|board| {
            Ok(board
                .laundry
                .reserve(&Resident::new(resident), date, slot, today)?)
        })
    }

    /// Cancels one of the requester's laundry bookings.
    ///
    /// # Errors
    ///
    /// Returns `BoardError::Laundry` or `BoardError::Persistence`.
    pub fn cancel_laundry(
        &mut self,
        requester: &str,
        date: NaiveDate,
        slot: LaundrySlot,
    ) -> Result<LaundryReservation, BoardError> {
        self.transaction(|board| Ok(board.laundry.cancel(requester, date, slot)?))
    }

    /// Replaces `username`'s password after checking the current one. The
    /// new digest is saved with the board so it survives a restart.
    ///
    /// # Errors
    ///
    /// Returns `BoardError::Auth` when the change is refused, or
    /// `BoardError::Persistence` (the old password stays in force).
    pub fn change_password(
        &mut self,
        username: &str,
        current: &str,
        new: &str,
    ) -> Result<(), BoardError> {
        self.transaction(|board| Ok(board.users.change_password(username, current, new)?))
    }

    // --- views ---

    /// Current instant according to the board's clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Today's local date.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.store.calendar().local_date(self.now())
    }

    /// The household calendar.
    #[must_use]
    pub const fn calendar(&self) -> &Calendar {
        self.store.calendar()
    }

    /// The task store, read-only.
    #[must_use]
    pub const fn store(&self) -> &TaskStore {
        &self.store
    }

    /// All tasks in display order.
    #[must_use]
    pub fn tasks(&self) -> &[TaskInstance] {
        self.store.tasks()
    }

    /// Open tasks.
    #[must_use]
    pub fn active(&self) -> Vec<&TaskInstance> {
        self.store.active()
    }

    /// Completed tasks.
    #[must_use]
    pub fn completed(&self) -> Vec<&TaskInstance> {
        self.store.completed()
    }

    /// Completion statistics as of now.
    #[must_use]
    pub fn metrics(&self) -> MetricsReport {
        metrics::compute(self.store.tasks(), self.now())
    }

    /// Completions grouped by month.
    #[must_use]
    pub fn report(&self) -> Vec<MonthlyReport> {
        report::completion_report(self.store.tasks(), self.store.calendar())
    }

    /// Resident on duty today in the whole-roster rotation.
    #[must_use]
    pub fn daily_resident(&self) -> Option<Resident> {
        self.store.daily_resident(self.now())
    }

    /// Checks a login.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if either part is wrong.
    pub fn verify(&self, username: &str, password: &str) -> Result<UserInfo, AuthError> {
        self.users.verify(username, password)
    }

    /// The user directory, read-only.
    #[must_use]
    pub const fn users(&self) -> &UserDirectory {
        &self.users
    }

    /// The laundry book, read-only.
    #[must_use]
    pub const fn laundry(&self) -> &LaundryBook {
        &self.laundry
    }

    /// The document that would be saved now.
    #[must_use]
    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            tasks: self.store.tasks().to_vec(),
            queued: self.store.queued_occurrences().cloned().collect(),
            reservations: self.laundry.reservations().to_vec(),
            last_rollover_check: self.rollover.last_check(),
            credentials: self.users.credentials(),
        }
    }

    // --- saving ---

    /// Applies `mutate` and saves. If either step fails the in-memory state
    /// goes back to what it was before `mutate` ran.
    fn transaction<T>(
        &mut self,
        mutate: impl FnOnce(&mut Self) -> Result<T, BoardError>,
    ) -> Result<T, BoardError> {
        let checkpoint = self.checkpoint();
        let result = mutate(self).and_then(|value| {
            self.save()?;
            Ok(value)
        });
        if result.is_err() {
            self.rollback(checkpoint);
        }
        result
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            store: self.store.clone(),
            laundry: self.laundry.clone(),
            rollover: self.rollover.clone(),
            users: self.users.clone(),
        }
    }

    fn rollback(&mut self, checkpoint: Checkpoint) {
        self.store = checkpoint.store;
        self.laundry = checkpoint.laundry;
        self.rollover = checkpoint.rollover;
        self.users = checkpoint.users;
    }

    fn save(&self) -> Result<(), PersistenceError> {
        self.persistence.save(&self.snapshot()).inspect_err(|e| {
            tracing::error!(error = %e, "failed to save board, rolling back");
        })
    }
}
