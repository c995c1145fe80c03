//! Recurring task templates and their live instances.
//!
//! A [`TaskDefinition`] is the fixed template (title, cadence, area). A
//! [`TaskInstance`] is the single live record derived from it, replaced in
//! place every period. When an instance is completed the engine computes
//! the next occurrence up front and parks it as a [`QueuedOccurrence`]
//! until the period rolls over.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::resident::Assignee;

/// Identifier of a task definition and of its live instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub u32);

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Cadence at which a task comes due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recurrence {
    /// Every calendar day.
    Daily,
    /// Every seven days; periods start on Monday.
    Weekly,
    /// Every calendar month.
    Monthly,
}

impl std::fmt::Display for Recurrence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Daily => write!(f, "daily"),
            Self::Weekly => write!(f, "weekly"),
            Self::Monthly => write!(f, "monthly"),
        }
    }
}

/// The fixed set of household chores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskTitle {
    /// Clean the left bathroom.
    LeftBathroom,
    /// Clean the right bathroom.
    RightBathroom,
    /// Clean the living room and kitchen.
    LivingRoomAndKitchen,
    /// Take out the trash.
    TakeOutTrash,
    /// Clean the fridge.
    Fridge,
    /// Grocery run.
    GroceryRun,
}

impl TaskTitle {
    /// Every title, in board order.
    pub const ALL: [Self; 6] = [
        Self::LeftBathroom,
        Self::RightBathroom,
        Self::LivingRoomAndKitchen,
        Self::TakeOutTrash,
        Self::Fridge,
        Self::GroceryRun,
    ];

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::LeftBathroom => "Clean the left bathroom",
            Self::RightBathroom => "Clean the right bathroom",
            Self::LivingRoomAndKitchen => "Clean the living room and kitchen",
            Self::TakeOutTrash => "Take out the trash",
            Self::Fridge => "Clean the fridge",
            Self::GroceryRun => "Grocery run",
        }
    }
}

impl std::fmt::Display for TaskTitle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Immutable template a live task is derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDefinition {
    /// Unique identifier, shared with the live instance.
    pub id: TaskId,
    /// Which chore this is.
    pub title: TaskTitle,
    /// How often it comes due.
    pub recurrence: Recurrence,
    /// Part of the house the chore covers.
    pub area: String,
    /// Display rank on the board.
    pub order: u32,
    /// Whether the chore is done by a fixed pair instead of one resident.
    #[serde(default)]
    pub requires_pair: bool,
}

/// The live record of a recurring task for the current period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskInstance {
    /// Definition identifier.
    pub id: TaskId,
    /// Which chore this is.
    pub title: TaskTitle,
    /// Cadence, copied from the definition.
    pub recurrence: Recurrence,
    /// Area, copied from the definition.
    pub area: String,
    /// Display rank, copied from the definition.
    pub order: u32,
    /// Whether the assignee is a pair.
    #[serde(default)]
    pub requires_pair: bool,
    /// Resident or pair responsible this period.
    pub assigned_to: Assignee,
    /// Whether the chore has been done this period.
    pub completed: bool,
    /// When this instance was materialized.
    pub created_at: DateTime<Utc>,
    /// When the chore is due. `None` if the stored value was unreadable.
    #[serde(default, with = "lenient_timestamp")]
    pub deadline: Option<DateTime<Utc>>,
    /// When it was completed; set only while `completed`.
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// Whether completion came after the deadline; set only while `completed`.
    #[serde(default)]
    pub was_late: Option<bool>,
}

impl TaskInstance {
    /// Materializes a fresh, incomplete instance of `definition`.
    #[must_use]
    pub fn new(
        definition: &TaskDefinition,
        assigned_to: Assignee,
        created_at: DateTime<Utc>,
        deadline: DateTime<Utc>,
    ) -> Self {
        Self {
            id: definition.id,
            title: definition.title,
            recurrence: definition.recurrence,
            area: definition.area.clone(),
            order: definition.order,
            requires_pair: definition.requires_pair,
            assigned_to,
            completed: false,
            created_at,
            deadline: Some(deadline),
            completed_at: None,
            was_late: None,
        }
    }

    /// Returns `true` if the task is open and its deadline has passed.
    ///
    /// A task without a readable deadline is never overdue.
    #[must_use]
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.completed && self.deadline.is_some_and(|deadline| now > deadline)
    }

    /// Returns the deadline, or `now` when it is missing.
    #[must_use]
    pub fn deadline_or(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.deadline.unwrap_or(now)
    }

    /// Marks the task done at `at`.
    pub fn mark_completed(&mut self, at: DateTime<Utc>, was_late: bool) {
        self.completed = true;
        self.completed_at = Some(at);
        self.was_late = Some(was_late);
    }

    /// Reopens the task, clearing completion metadata together.
    pub fn mark_incomplete(&mut self) {
        self.completed = false;
        self.completed_at = None;
        self.was_late = None;
    }
}

/// The next occurrence of a task, computed when it was completed and
/// installed at the next period rollover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedOccurrence {
    /// Task the occurrence belongs to.
    pub task_id: TaskId,
    /// Successor in the rotation.
    pub assigned_to: Assignee,
    /// Next due date.
    pub deadline: DateTime<Utc>,
}

/// Deadlines are stored as RFC 3339 strings and read back leniently: an
/// unparseable value becomes `None` instead of failing the whole document.
mod lenient_timestamp {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        value.map(|ts| ts.to_rfc3339()).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.and_then(|s| {
            DateTime::parse_from_rfc3339(&s)
                .ok()
                .map(|ts| ts.with_timezone(&Utc))
        }))
    }
}
