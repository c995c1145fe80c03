//! The task record store.
//!
//! Holds exactly one [`TaskInstance`] per [`TaskDefinition`], applies
//! completion toggles, and replaces instances in place when their period
//! rolls over. Completing a task computes its next occurrence (successor
//! assignee and next deadline) immediately and queues it; only a rollover
//! installs a queued occurrence.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use chores_proto::resident::{Assignee, Resident};
use chores_proto::task::{QueuedOccurrence, Recurrence, TaskDefinition, TaskId, TaskInstance};

use crate::auth::Authorizer;
use crate::calendar::Calendar;
use crate::recurrence::next_deadline_in;
use crate::roster::{Roster, RosterError};
use crate::rotation::{RotationError, RotationSelector};

/// Error type for store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// No task with this id.
    #[error("task not found: {0}")]
    NotFound(TaskId),
    /// The requester is not assigned to the task.
    #[error("{requester} is not assigned to task {task_id}")]
    Unauthorized {
        /// Task the requester tried to toggle.
        task_id: TaskId,
        /// Who asked.
        requester: String,
    },
    /// Two definitions share an id.
    #[error("duplicate task definition id: {0}")]
    DuplicateDefinition(TaskId),
    /// The roster cannot serve the definitions.
    #[error(transparent)]
    Roster(#[from] RosterError),
    /// No assignee could be selected.
    #[error(transparent)]
    Rotation(#[from] RotationError),
}

/// Result of a successful toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The task was completed; its next occurrence is queued.
    Completed {
        /// The task after completion.
        task: TaskInstance,
        /// The queued next occurrence.
        next: QueuedOccurrence,
    },
    /// The task was reopened; any queued occurrence was discarded.
    Reopened {
        /// The task after reopening.
        task: TaskInstance,
    },
}

impl ToggleOutcome {
    /// The toggled task.
    #[must_use]
    pub const fn task(&self) -> &TaskInstance {
        match self {
            Self::Completed { task, .. } | Self::Reopened { task } => task,
        }
    }
}

/// Task instances plus the definitions, roster, and calendar that drive
/// them.
#[derive(Debug, Clone)]
pub struct TaskStore {
    definitions: Vec<TaskDefinition>,
    roster: Roster,
    calendar: Calendar,
    tasks: Vec<TaskInstance>,
    queued: BTreeMap<TaskId, QueuedOccurrence>,
}

impl TaskStore {
    /// Creates an empty store after validating definitions against the
    /// roster. Call [`initialize`](Self::initialize) or
    /// [`restore`](Self::restore) before use.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DuplicateDefinition` for repeated ids or
    /// `StoreError::Roster` if a definition has no usable ordering.
    pub fn new(
        mut definitions: Vec<TaskDefinition>,
        roster: Roster,
        calendar: Calendar,
    ) -> Result<Self, StoreError> {
        let mut ids = HashSet::new();
        for definition in &definitions {
            if !ids.insert(definition.id) {
                return Err(StoreError::DuplicateDefinition(definition.id));
            }
        }
        roster.validate_for(&definitions)?;
        definitions.sort_by_key(|d| (d.order, d.id));
        Ok(Self {
            definitions,
            roster,
            calendar,
            tasks: Vec::new(),
            queued: BTreeMap::new(),
        })
    }

    /// Builds one fresh instance per definition, assigned by the current
    /// period index. Discards all queued occurrences.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Rotation` if an ordering is empty.
    pub fn initialize(&mut self, now: DateTime<Utc>) -> Result<(), StoreError> {
        let tasks = self
            .definitions
            .iter()
            .map(|definition| self.fresh_instance(definition, now))
            .collect::<Result<Vec<_>, _>>()?;
        self.tasks = tasks;
        self.queued.clear();
        tracing::info!(tasks = self.tasks.len(), "task store initialized");
        Ok(())
    }

    /// Rebuilds every instance as at initialization.
    ///
    /// # Errors
    ///
    /// Same as [`initialize`](Self::initialize).
    pub fn reset(&mut self, now: DateTime<Utc>) -> Result<(), StoreError> {
        tracing::info!("resetting all tasks");
        self.initialize(now)
    }

    /// Loads previously persisted instances.
    ///
    /// Duplicate ids keep the first instance; instances without a
    /// definition are dropped; definitions without an instance get a fresh
    /// one. An instance whose assignee is no longer in its ordering is
    /// replaced by a fresh one for the current period. Template fields are
    /// refreshed from the definitions. Queued occurrences survive only for
    /// tasks that are still completed.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Rotation` if an instance cannot be assigned.
    pub fn restore(
        &mut self,
        tasks: Vec<TaskInstance>,
        queued: Vec<QueuedOccurrence>,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut seen = HashSet::new();
        let mut kept = Vec::with_capacity(self.definitions.len());
        for mut task in tasks {
            let Some(definition) = self.definition(task.id) else {
                tracing::warn!(task_id = %task.id, "dropping stored task with no definition");
                continue;
            };
            if !seen.insert(task.id) {
                tracing::warn!(task_id = %task.id, "dropping duplicate stored task");
                continue;
            }
            if !self
                .roster
                .ordering_for(definition.title)
                .contains(&task.assigned_to)
            {
                tracing::warn!(
                    task_id = %task.id,
                    assignee = %task.assigned_to,
                    "stored assignee is not in the ordering, reassigning"
                );
                kept.push(self.fresh_instance(definition, now)?);
                continue;
            }
            task.title = definition.title;
            task.recurrence = definition.recurrence;
            task.area.clone_from(&definition.area);
            task.order = definition.order;
            task.requires_pair = definition.requires_pair;
            kept.push(task);
        }
        for definition in &self.definitions {
            if !seen.contains(&definition.id) {
                tracing::info!(task_id = %definition.id, "creating missing task");
                kept.push(self.fresh_instance(definition, now)?);
            }
        }
        kept.sort_by_key(|t| (t.order, t.id));

        self.queued = queued
            .into_iter()
            .filter(|q| kept.iter().any(|t| t.id == q.task_id && t.completed))
            .map(|q| (q.task_id, q))
            .collect();
        self.tasks = kept;
        tracing::info!(
            tasks = self.tasks.len(),
            queued = self.queued.len(),
            "task store restored"
        );
        Ok(())
    }

    // --- toggling ---

    /// Flips the completion state of a task on behalf of `requester`.
    ///
    /// Completing records `completed_at = now` and whether the deadline was
    /// missed, then queues the next occurrence: the successor assignee and
    /// the deadline one period after the old deadline (or after `now` if the
    /// task was late or had no deadline). Reopening clears the completion
    /// fields and discards the queued occurrence.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` for an unknown id,
    /// `StoreError::Unauthorized` if the authorizer rejects the requester
    /// (the store is untouched in both cases), or `StoreError::Rotation` if
    /// no successor can be chosen.
    pub fn toggle(
        &mut self,
        id: TaskId,
        requester: &str,
        authorizer: &dyn Authorizer,
        now: DateTime<Utc>,
    ) -> Result<ToggleOutcome, StoreError> {
        let index = self.position(id).ok_or(StoreError::NotFound(id))?;
        let task = &self.tasks[index];
        if !authorizer.may_toggle(&task.assigned_to, requester) {
            tracing::warn!(task_id = %id, requester, "toggle rejected: not assigned");
            return Err(StoreError::Unauthorized {
                task_id: id,
                requester: requester.to_string(),
            });
        }

        if task.completed {
            let task = &mut self.tasks[index];
            task.mark_incomplete();
            self.queued.remove(&id);
            tracing::info!(task_id = %id, requester, "task reopened");
            return Ok(ToggleOutcome::Reopened { task: task.clone() });
        }

        let was_late = task.deadline.is_some_and(|deadline| now > deadline);
        let base = match task.deadline {
            Some(deadline) if !was_late => deadline,
            _ => now,
        };
        let next = QueuedOccurrence {
            task_id: id,
            assigned_to: RotationSelector::new(&self.roster, &self.calendar).successor(
                task.title,
                task.recurrence,
                &task.assigned_to,
                now,
            )?,
            deadline: next_deadline_in(base, task.recurrence, self.calendar.offset()),
        };

        let task = &mut self.tasks[index];
        task.mark_completed(now, was_late);
        self.queued.insert(id, next.clone());
        tracing::info!(
            task_id = %id,
            requester,
            was_late,
            next_assignee = %next.assigned_to,
            next_deadline = %next.deadline,
            "task completed"
        );
        Ok(ToggleOutcome::Completed {
            task: task.clone(),
            next,
        })
    }

    // --- rollover ---

    /// Installs the next period for every task of `recurrence`.
    ///
    /// Daily and weekly tasks are replaced only if completed, assigned by
    /// the new period index. Monthly tasks always advance one successor
    /// step and reopen. The deadline is the queued one when it is still
    /// ahead of `now`, else one period after `now`. Returns the ids that
    /// were replaced.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Rotation` if an ordering is empty; tasks
    /// replaced before the failure stay replaced.
    pub fn roll_over(
        &mut self,
        recurrence: Recurrence,
        now: DateTime<Utc>,
    ) -> Result<Vec<TaskId>, StoreError> {
        let selector = RotationSelector::new(&self.roster, &self.calendar);
        let offset = self.calendar.offset();
        let mut replaced = Vec::new();

        for task in self.tasks.iter_mut().filter(|t| t.recurrence == recurrence) {
            let assigned_to = match recurrence {
                Recurrence::Monthly => {
                    selector.successor(task.title, recurrence, &task.assigned_to, now)?
                }
                Recurrence::Daily | Recurrence::Weekly => {
                    if !task.completed {
                        continue;
                    }
                    selector.for_period(task.title, recurrence, now)?
                }
            };
            let deadline = self
                .queued
                .remove(&task.id)
                .map(|q| q.deadline)
                .filter(|deadline| *deadline > now)
                .unwrap_or_else(|| next_deadline_in(now, recurrence, offset));

            tracing::info!(
                task_id = %task.id,
                %recurrence,
                previous = %task.assigned_to,
                assignee = %assigned_to,
                %deadline,
                "task rolled over"
            );
            task.assigned_to = assigned_to;
            task.created_at = now;
            task.deadline = Some(deadline);
            task.mark_incomplete();
            replaced.push(task.id);
        }
        Ok(replaced)
    }

    // --- queries ---

    /// Task definitions in display order.
    #[must_use]
    pub fn definitions(&self) -> &[TaskDefinition] {
        &self.definitions
    }

    /// Looks up a definition by id.
    #[must_use]
    pub fn definition(&self, id: TaskId) -> Option<&TaskDefinition> {
        self.definitions.iter().find(|d| d.id == id)
    }

    /// The roster in use.
    #[must_use]
    pub const fn roster(&self) -> &Roster {
        &self.roster
    }

    /// The calendar in use.
    #[must_use]
    pub const fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    /// All tasks, in display order.
    #[must_use]
    pub fn tasks(&self) -> &[TaskInstance] {
        &self.tasks
    }

    /// Looks up a task by id.
    #[must_use]
    pub fn task(&self, id: TaskId) -> Option<&TaskInstance> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Tasks not yet completed.
    #[must_use]
    pub fn active(&self) -> Vec<&TaskInstance> {
        self.tasks.iter().filter(|t| !t.completed).collect()
    }

    /// Tasks completed this period.
    #[must_use]
    pub fn completed(&self) -> Vec<&TaskInstance> {
        self.tasks.iter().filter(|t| t.completed).collect()
    }

    /// Tasks whose assignee includes `name`.
    #[must_use]
    pub fn assigned_to(&self, name: &str) -> Vec<&TaskInstance> {
        self.tasks
            .iter()
            .filter(|t| t.assigned_to.includes(name))
            .collect()
    }

    /// Open tasks past their deadline.
    #[must_use]
    pub fn overdue(&self, now: DateTime<Utc>) -> Vec<&TaskInstance> {
        self.tasks.iter().filter(|t| t.is_overdue(now)).collect()
    }

    /// Whether a task is overdue; `None` for an unknown id.
    #[must_use]
    pub fn is_overdue(&self, id: TaskId, now: DateTime<Utc>) -> Option<bool> {
        self.task(id).map(|t| t.is_overdue(now))
    }

    /// The queued next occurrence of a task, if it has been completed.
    #[must_use]
    pub fn queued(&self, id: TaskId) -> Option<&QueuedOccurrence> {
        self.queued.get(&id)
    }

    /// All queued occurrences, by task id.
    pub fn queued_occurrences(&self) -> impl Iterator<Item = &QueuedOccurrence> {
        self.queued.values()
    }

    /// Resident on duty in the whole-roster daily rotation.
    #[must_use]
    pub fn daily_resident(&self, now: DateTime<Utc>) -> Option<Resident> {
        RotationSelector::new(&self.roster, &self.calendar).daily_resident(now)
    }

    fn position(&self, id: TaskId) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == id)
    }

    fn fresh_instance(
        &self,
        definition: &TaskDefinition,
        now: DateTime<Utc>,
    ) -> Result<TaskInstance, StoreError> {
        let assigned_to: Assignee = RotationSelector::new(&self.roster, &self.calendar)
            .for_period(definition.title, definition.recurrence, now)?;
        let deadline = next_deadline_in(now, definition.recurrence, self.calendar.offset());
        Ok(TaskInstance::new(definition, assigned_to, now, deadline))
    }
}
