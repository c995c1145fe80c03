//! Property-based tests for rotation and deadline arithmetic.
//!
//! Uses proptest to verify:
//! 1. Index selection is periodic in the ordering length.
//! 2. Index selection never fails for a non-empty ordering, even for
//!    negative indices.
//! 3. Applying the successor N times returns to the start.
//! 4. Daily and weekly deadlines advance by exactly one or seven days.
//! 5. Monthly deadlines land in the next calendar month.

#![allow(clippy::unwrap_used)]

use chores::recurrence::next_deadline;
use chores::rotation::{select_by_index, select_successor};
use chrono::{DateTime, Datelike, TimeDelta, TimeZone, Utc};
use chores_proto::resident::Assignee;
use chores_proto::task::Recurrence;
use proptest::prelude::*;

// --- strategies ---

/// Orderings of 1..12 distinct single residents.
fn arb_ordering() -> impl Strategy<Value = Vec<Assignee>> {
    (1usize..12).prop_map(|n| (0..n).map(|i| Assignee::single(&format!("R{i}"))).collect())
}

/// Instants between 2000 and 2100.
fn arb_instant() -> impl Strategy<Value = DateTime<Utc>> {
    (946_684_800i64..4_102_444_800i64)
        .prop_map(|secs| Utc.timestamp_opt(secs, 0).single().unwrap_or_default())
}

proptest! {
    #[test]
    fn index_selection_is_periodic(ordering in arb_ordering(), index in -1_000_000i64..1_000_000) {
        let n = i64::try_from(ordering.len()).unwrap();
        prop_assert_eq!(
            select_by_index(&ordering, index),
            select_by_index(&ordering, index + n)
        );
    }

    #[test]
    fn index_selection_is_always_in_range(ordering in arb_ordering(), index in any::<i64>()) {
        let picked = select_by_index(&ordering, index).unwrap();
        prop_assert!(ordering.contains(&picked));
    }

    #[test]
    fn successor_cycle_returns_to_start(ordering in arb_ordering(), start in 0usize..12) {
        let start = start % ordering.len();
        let mut current = ordering[start].clone();
        for _ in 0..ordering.len() {
            current = select_successor(&ordering, &current).unwrap();
        }
        prop_assert_eq!(current, ordering[start].clone());
    }

    #[test]
    fn daily_and_weekly_deadlines_are_fixed_steps(base in arb_instant()) {
        prop_assert_eq!(next_deadline(base, Recurrence::Daily) - base, TimeDelta::days(1));
        prop_assert_eq!(next_deadline(base, Recurrence::Weekly) - base, TimeDelta::days(7));
    }

    #[test]
    fn monthly_deadline_lands_in_next_month(base in arb_instant()) {
        let next = next_deadline(base, Recurrence::Monthly);
        let months = |ts: DateTime<Utc>| i64::from(ts.year()) * 12 + i64::from(ts.month0());
        prop_assert_eq!(months(next), months(base) + 1);
        prop_assert!(next.day() <= base.day());
        prop_assert_eq!(next.time(), base.time());
    }
}
