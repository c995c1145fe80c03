//! Deadline arithmetic for recurring chores.
//!
//! Daily and weekly steps add whole calendar days. Monthly steps keep the
//! day-of-month and clamp to the last day of a shorter target month
//! (Jan 31 becomes Feb 29 in a leap year, Feb 28 otherwise; Mar 31 becomes
//! Apr 30). All steps are taken in the household's local offset.

use chrono::{DateTime, Days, FixedOffset, Months, Offset, Utc};
use chores_proto::task::Recurrence;

/// Next deadline after `base`, computed in UTC.
#[must_use]
pub fn next_deadline(base: DateTime<Utc>, recurrence: Recurrence) -> DateTime<Utc> {
    next_deadline_in(base, recurrence, Utc.fix())
}

/// Next deadline after `base`, computed in the given local offset.
///
/// Falls back to `base` itself only if the result would leave chrono's
/// representable range.
#[must_use]
pub fn next_deadline_in(
    base: DateTime<Utc>,
    recurrence: Recurrence,
    offset: FixedOffset,
) -> DateTime<Utc> {
    let local = base.with_timezone(&offset);
    let next = match recurrence {
        Recurrence::Daily => local.checked_add_days(Days::new(1)),
        Recurrence::Weekly => local.checked_add_days(Days::new(7)),
        Recurrence::Monthly => local.checked_add_months(Months::new(1)),
    };
    next.map_or_else(
        || {
            tracing::warn!(%base, %recurrence, "deadline out of range, keeping base");
            base
        },
        |ts| ts.with_timezone(&Utc),
    )
}
