//! Household calendar: local dates, period boundaries, and rotation indices.
//!
//! All period arithmetic happens in one fixed UTC offset so that "a new
//! day" means local midnight. Rotation indices count whole periods since a
//! fixed epoch date (local midnight of 2024-01-01 by default, a Monday).

use chrono::{DateTime, Datelike, Days, FixedOffset, NaiveDate, NaiveTime, Offset, TimeDelta, Utc};
use chores_proto::task::Recurrence;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;
const WEEK_MS: i64 = 7 * DAY_MS;

/// Default rotation epoch.
pub const DEFAULT_EPOCH: NaiveDate = match NaiveDate::from_ymd_opt(2024, 1, 1) {
    Some(date) => date,
    None => panic!("invalid default epoch"),
};

/// Local time rules for one household.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calendar {
    offset: FixedOffset,
    epoch: NaiveDate,
}

impl Default for Calendar {
    fn default() -> Self {
        Self::utc()
    }
}

impl Calendar {
    /// Creates a calendar for the given offset and rotation epoch.
    #[must_use]
    pub const fn new(offset: FixedOffset, epoch: NaiveDate) -> Self {
        Self { offset, epoch }
    }

    /// UTC calendar with the default epoch.
    #[must_use]
    pub fn utc() -> Self {
        Self::new(Utc.fix(), DEFAULT_EPOCH)
    }

    /// Builds a calendar from an offset in minutes east of UTC.
    ///
    /// Returns `None` if the offset is out of range (beyond ±24h).
    #[must_use]
    pub fn from_offset_minutes(minutes: i32, epoch: NaiveDate) -> Option<Self> {
        let offset = FixedOffset::east_opt(minutes.checked_mul(60)?)?;
        Some(Self::new(offset, epoch))
    }

    /// The household's UTC offset.
    #[must_use]
    pub const fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// The rotation epoch date.
    #[must_use]
    pub const fn epoch(&self) -> NaiveDate {
        self.epoch
    }

    /// Converts an instant to household local time.
    #[must_use]
    pub fn local(&self, ts: DateTime<Utc>) -> DateTime<FixedOffset> {
        ts.with_timezone(&self.offset)
    }

    /// Local calendar date of an instant.
    #[must_use]
    pub fn local_date(&self, ts: DateTime<Utc>) -> NaiveDate {
        self.local(ts).date_naive()
    }

    /// Instant of local midnight at the start of `date`.
    #[must_use]
    pub fn start_of_day(&self, date: NaiveDate) -> DateTime<Utc> {
        let local_midnight = date.and_time(NaiveTime::MIN);
        (local_midnight - TimeDelta::seconds(i64::from(self.offset.local_minus_utc()))).and_utc()
    }

    /// Instant the rotation epoch begins.
    #[must_use]
    pub fn epoch_start(&self) -> DateTime<Utc> {
        self.start_of_day(self.epoch)
    }

    /// Monday of the ISO week containing `date`.
    #[must_use]
    pub fn week_start(date: NaiveDate) -> NaiveDate {
        let back = u64::from(date.weekday().num_days_from_monday());
        date.checked_sub_days(Days::new(back)).unwrap_or(date)
    }

    /// First local date of the period of `recurrence` that contains `ts`.
    ///
    /// Two instants are in the same period iff their period starts match.
    #[must_use]
    pub fn period_start(&self, recurrence: Recurrence, ts: DateTime<Utc>) -> NaiveDate {
        let date = self.local_date(ts);
        match recurrence {
            Recurrence::Daily => date,
            Recurrence::Weekly => Self::week_start(date),
            Recurrence::Monthly => date.with_day(1).unwrap_or(date),
        }
    }

    /// Number of whole periods elapsed between the epoch's period and the
    /// period containing `now`.
    ///
    /// Indices count from the period the epoch falls in, so they step
    /// exactly at the boundaries rollover uses: local midnight, Monday, and
    /// the 1st of the month. An epoch in mid-week or mid-month does not
    /// shift the phase. Instants before the epoch give negative indices.
    #[must_use]
    pub fn period_index(&self, recurrence: Recurrence, now: DateTime<Utc>) -> i64 {
        match recurrence {
            Recurrence::Daily => {
                (now - self.epoch_start()).num_milliseconds().div_euclid(DAY_MS)
            }
            Recurrence::Weekly => {
                let first_monday = self.start_of_day(Self::week_start(self.epoch));
                (now - first_monday).num_milliseconds().div_euclid(WEEK_MS)
            }
            Recurrence::Monthly => self.months_since_epoch(now),
        }
    }

    fn months_since_epoch(&self, now: DateTime<Utc>) -> i64 {
        let local = self.local_date(now);
        i64::from(local.year() - self.epoch.year()) * 12 + i64::from(local.month())
            - i64::from(self.epoch.month())
    }
}
