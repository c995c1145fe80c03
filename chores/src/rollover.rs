//! Period rollover detection.
//!
//! The checker remembers when it last ran. On each check it compares the
//! day, ISO week, and month of the previous check with those of `now` (in
//! the household offset) and rolls over every recurrence whose period
//! changed. Comparing periods rather than counting ticks means a check
//! that arrives hours late still fires exactly once.

use chrono::{DateTime, Utc};
use chores_proto::task::{Recurrence, TaskId};

use crate::calendar::Calendar;
use crate::store::{StoreError, TaskStore};

/// Which period boundaries lie between two instants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Boundaries {
    /// A new local day started.
    pub day: bool,
    /// A new ISO week (Monday start) started.
    pub week: bool,
    /// A new calendar month started.
    pub month: bool,
}

impl Boundaries {
    /// Boundaries crossed going from `previous` to `now`.
    ///
    /// Nothing is crossed when `now` is not after `previous`.
    #[must_use]
    pub fn crossed(calendar: &Calendar, previous: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        if now <= previous {
            return Self::default();
        }
        let changed = |recurrence| {
            calendar.period_start(recurrence, previous) != calendar.period_start(recurrence, now)
        };
        Self {
            day: changed(Recurrence::Daily),
            week: changed(Recurrence::Weekly),
            month: changed(Recurrence::Monthly),
        }
    }

    /// Whether any boundary was crossed.
    #[must_use]
    pub const fn any(self) -> bool {
        self.day || self.week || self.month
    }
}

/// What one check did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RolloverReport {
    /// Boundaries detected.
    pub boundaries: Boundaries,
    /// Daily tasks replaced.
    pub daily: Vec<TaskId>,
    /// Weekly tasks replaced.
    pub weekly: Vec<TaskId>,
    /// Monthly tasks replaced.
    pub monthly: Vec<TaskId>,
}

impl RolloverReport {
    /// Whether any task changed.
    #[must_use]
    pub fn changed(&self) -> bool {
        !(self.daily.is_empty() && self.weekly.is_empty() && self.monthly.is_empty())
    }
}

/// Remembers the last check time and fires rollovers on boundaries.
#[derive(Debug, Clone, Default)]
pub struct RolloverChecker {
    last_check: Option<DateTime<Utc>>,
}

impl RolloverChecker {
    /// Creates a checker resuming from a persisted last-check time.
    #[must_use]
    pub const fn new(last_check: Option<DateTime<Utc>>) -> Self {
        Self { last_check }
    }

    /// When the checker last ran.
    #[must_use]
    pub const fn last_check(&self) -> Option<DateTime<Utc>> {
        self.last_check
    }

    /// Rolls `store` over for every boundary crossed since the last check.
    ///
    /// The first check only records the time. A clock that moved backwards
    /// rolls nothing over and does not rewind the recorded time.
    ///
    /// # Errors
    ///
    /// Propagates `StoreError` from [`TaskStore::roll_over`]. The check
    /// time is not advanced on failure, so the next check retries.
    pub fn check(
        &mut self,
        store: &mut TaskStore,
        now: DateTime<Utc>,
    ) -> Result<RolloverReport, StoreError> {
        let Some(previous) = self.last_check else {
            tracing::debug!(%now, "first rollover check, recording time");
            self.last_check = Some(now);
            return Ok(RolloverReport::default());
        };
        if now < previous {
            tracing::warn!(%previous, %now, "clock moved backwards, skipping rollover");
            return Ok(RolloverReport::default());
        }

        let boundaries = Boundaries::crossed(store.calendar(), previous, now);
        let mut report = RolloverReport {
            boundaries,
            ..RolloverReport::default()
        };
        if boundaries.day {
            report.daily = store.roll_over(Recurrence::Daily, now)?;
        }
        if boundaries.week {
            report.weekly = store.roll_over(Recurrence::Weekly, now)?;
        }
        if boundaries.month {
            report.monthly = store.roll_over(Recurrence::Monthly, now)?;
        }
        self.last_check = Some(now);

        if boundaries.any() {
            tracing::info!(
                day = boundaries.day,
                week = boundaries.week,
                month = boundaries.month,
                daily = report.daily.len(),
                weekly = report.weekly.len(),
                monthly = report.monthly.len(),
                "period rollover"
            );
        }
        Ok(report)
    }
}
