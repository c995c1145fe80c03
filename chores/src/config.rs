//! Household configuration: residents, chores, rotation orderings, users.
//!
//! Deserialized from TOML. Every field has a default, and the defaults
//! describe the original eight-resident household, so an empty document is
//! a complete configuration.
//!
//! ```toml
//! residents = ["Ana", "Bea", "Caio", "Duda"]
//! epoch = "2024-01-01"
//! utc_offset_minutes = -180
//! admins = ["Ana"]
//!
//! [[tasks]]
//! id = 1
//! title = "grocery_run"
//! recurrence = "weekly"
//! area = "General"
//! order = 1
//! requires_pair = true
//!
//! [[overrides]]
//! task = "grocery_run"
//! ordering = [["Ana", "Bea"], ["Caio", "Duda"]]
//! ```

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use chores_proto::resident::{Assignee, Resident};
use chores_proto::task::{Recurrence, TaskDefinition, TaskId, TaskTitle};
use serde::Deserialize;

use crate::auth::UserDirectory;
use crate::calendar::{Calendar, DEFAULT_EPOCH};
use crate::roster::{Roster, RosterError};
use crate::store::{StoreError, TaskStore};

/// Errors that can occur when loading or applying household configuration.
#[derive(Debug, thiserror::Error)]
pub enum HouseholdConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read household file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse the TOML document.
    #[error("failed to parse household config: {0}")]
    ParseToml(#[from] toml::de::Error),
    /// The UTC offset is out of range.
    #[error("utc_offset_minutes {0} is out of range")]
    InvalidOffset(i32),
    /// An admin is not a known user.
    #[error("admin '{0}' is neither a resident nor an extra user")]
    UnknownAdmin(String),
    /// The same name (ignoring case) is listed twice among residents and
    /// extra users.
    #[error("user '{0}' is listed more than once")]
    DuplicateUser(String),
    /// The residents or orderings are invalid.
    #[error(transparent)]
    Roster(#[from] RosterError),
    /// The task definitions are invalid.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// One slot in a configured ordering: a name or a two-name pair.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum OrderingEntry {
    /// A single resident.
    Single(String),
    /// A fixed pair.
    Pair([String; 2]),
}

/// Override ordering for one chore.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OverrideConfig {
    /// Chore the ordering applies to.
    pub task: TaskTitle,
    /// Rotation order.
    pub ordering: Vec<OrderingEntry>,
}

/// The household as configured.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HouseholdConfig {
    /// Residents in roster order.
    pub residents: Vec<String>,
    /// Rotation epoch (local midnight).
    pub epoch: NaiveDate,
    /// Household offset from UTC in minutes (east positive).
    pub utc_offset_minutes: i32,
    /// Users allowed to reset the board.
    pub admins: Vec<String>,
    /// Users who may log in but are not on the roster.
    pub extra_users: Vec<String>,
    /// Password every user starts with.
    pub initial_password: String,
    /// Chore definitions.
    pub tasks: Vec<TaskDefinition>,
    /// Per-chore orderings.
    pub overrides: Vec<OverrideConfig>,
}

impl Default for HouseholdConfig {
    fn default() -> Self {
        let names = |list: &[&str]| list.iter().map(ToString::to_string).collect::<Vec<_>>();
        let singles = |list: &[&str]| {
            list.iter()
                .map(|n| OrderingEntry::Single((*n).to_string()))
                .collect::<Vec<_>>()
        };
        let pairs = |list: &[[&str; 2]]| {
            list.iter()
                .map(|[a, b]| OrderingEntry::Pair([(*a).to_string(), (*b).to_string()]))
                .collect::<Vec<_>>()
        };

        Self {
            residents: names(&[
                "Lucas", "Luiz", "Kelvin", "Bruno", "Robson", "Fulano", "Natan", "Gabriel",
            ]),
            epoch: DEFAULT_EPOCH,
            utc_offset_minutes: 0,
            admins: names(&["Lucas", "Luiz"]),
            extra_users: names(&["Edila"]),
            initial_password: "123456".to_string(),
            tasks: default_tasks(),
            overrides: vec![
                OverrideConfig {
                    task: TaskTitle::LeftBathroom,
                    ordering: singles(&["Bruno", "Robson", "Kelvin", "Lucas"]),
                },
                OverrideConfig {
                    task: TaskTitle::RightBathroom,
                    ordering: singles(&["Gabriel", "Natan", "Luiz"]),
                },
                OverrideConfig {
                    task: TaskTitle::LivingRoomAndKitchen,
                    ordering: pairs(&[
                        ["Lucas", "Luiz"],
                        ["Gabriel", "Natan"],
                        ["Kelvin", "Robson"],
                        ["Bruno", "Fulano"],
                    ]),
                },
                OverrideConfig {
                    task: TaskTitle::TakeOutTrash,
                    ordering: singles(&[
                        "Natan", "Luiz", "Bruno", "Gabriel", "Lucas", "Kelvin", "Robson",
                    ]),
                },
                OverrideConfig {
                    task: TaskTitle::Fridge,
                    ordering: singles(&[
                        "Luiz", "Bruno", "Fulano", "Gabriel", "Lucas", "Kelvin", "Robson", "Natan",
                    ]),
                },
                OverrideConfig {
                    task: TaskTitle::GroceryRun,
                    ordering: pairs(&[
                        ["Robson", "Kelvin"],
                        ["Lucas", "Luiz"],
                        ["Natan", "Bruno"],
                        ["Gabriel", "Fulano"],
                    ]),
                },
            ],
        }
    }
}

fn default_tasks() -> Vec<TaskDefinition> {
    let task = |id: u32, title, recurrence, area: &str, requires_pair| TaskDefinition {
        id: TaskId(id),
        title,
        recurrence,
        area: area.to_string(),
        order: id,
        requires_pair,
    };
    vec![
        task(1, TaskTitle::LeftBathroom, Recurrence::Weekly, "Bathroom", false),
        task(2, TaskTitle::RightBathroom, Recurrence::Weekly, "Bathroom", false),
        task(
            3,
            TaskTitle::LivingRoomAndKitchen,
            Recurrence::Weekly,
            "Living room/Kitchen",
            true,
        ),
        task(4, TaskTitle::TakeOutTrash, Recurrence::Daily, "General", false),
        task(5, TaskTitle::Fridge, Recurrence::Monthly, "Kitchen", false),
        task(6, TaskTitle::GroceryRun, Recurrence::Weekly, "General", true),
    ]
}

impl HouseholdConfig {
    /// Parses a household document.
    ///
    /// # Errors
    ///
    /// Returns `HouseholdConfigError::ParseToml` for malformed TOML.
    pub fn from_toml_str(contents: &str) -> Result<Self, HouseholdConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Reads and parses a household file.
    ///
    /// # Errors
    ///
    /// Returns `HouseholdConfigError::ReadFile` or
    /// `HouseholdConfigError::ParseToml`.
    pub fn load(path: &Path) -> Result<Self, HouseholdConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|source| HouseholdConfigError::ReadFile {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_toml_str(&contents)
    }

    /// Builds the roster with every override ordering applied.
    ///
    /// Names in orderings are matched to residents case-insensitively and
    /// take the resident's configured spelling.
    ///
    /// # Errors
    ///
    /// Returns `HouseholdConfigError::Roster` for invalid residents or
    /// orderings.
    pub fn roster(&self) -> Result<Roster, HouseholdConfigError> {
        let residents: Vec<Resident> = self.residents.iter().map(Resident::new).collect();
        let canonical = |name: &str| {
            residents
                .iter()
                .find(|r| r.matches(name))
                .cloned()
                .unwrap_or_else(|| Resident::new(name))
        };

        let mut roster = Roster::new(residents.clone())?;
        for entry in &self.overrides {
            let ordering = entry
                .ordering
                .iter()
                .map(|slot| match slot {
                    OrderingEntry::Single(name) => Assignee::Single(canonical(name)),
                    OrderingEntry::Pair([a, b]) => Assignee::Pair(canonical(a), canonical(b)),
                })
                .collect();
            roster = roster.with_override(entry.task, ordering)?;
        }
        Ok(roster)
    }

    /// The household calendar.
    ///
    /// # Errors
    ///
    /// Returns `HouseholdConfigError::InvalidOffset` if the offset is beyond
    /// a day.
    pub fn calendar(&self) -> Result<Calendar, HouseholdConfigError> {
        Calendar::from_offset_minutes(self.utc_offset_minutes, self.epoch)
            .ok_or(HouseholdConfigError::InvalidOffset(self.utc_offset_minutes))
    }

    /// The chore definitions.
    #[must_use]
    pub fn definitions(&self) -> Vec<TaskDefinition> {
        self.tasks.clone()
    }

    /// An empty task store for this household.
    ///
    /// # Errors
    ///
    /// Returns `HouseholdConfigError` if the roster, calendar, or
    /// definitions are invalid.
    pub fn task_store(&self) -> Result<TaskStore, HouseholdConfigError> {
        Ok(TaskStore::new(
            self.definitions(),
            self.roster()?,
            self.calendar()?,
        )?)
    }

    /// The user directory: every resident and extra user with the initial
    /// password.
    ///
    /// # Errors
    ///
    /// Returns `HouseholdConfigError::DuplicateUser` if a name appears
    /// twice, or `HouseholdConfigError::UnknownAdmin` if an admin is not a
    /// user. Names are compared the way residents are, ignoring case.
    pub fn users(&self) -> Result<UserDirectory, HouseholdConfigError> {
        let mut everyone: Vec<Resident> = Vec::new();
        for name in self.residents.iter().chain(&self.extra_users) {
            if everyone.iter().any(|user| user.matches(name)) {
                return Err(HouseholdConfigError::DuplicateUser(name.clone()));
            }
            everyone.push(Resident::new(name.as_str()));
        }
        if let Some(admin) = self
            .admins
            .iter()
            .find(|admin| !everyone.iter().any(|user| user.matches(admin)))
        {
            return Err(HouseholdConfigError::UnknownAdmin(admin.clone()));
        }

        let mut users = UserDirectory::new();
        for user in &everyone {
            let admin = self.admins.iter().any(|name| user.matches(name));
            users.add_user(user.as_str(), &self.initial_password, admin);
        }
        Ok(users)
    }
}
