//! Rotation and deadline scenarios across the roster, selector, store, and
//! rollover checker.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use chores::auth::AssigneeAuthorizer;
use chores::calendar::Calendar;
use chores::rollover::RolloverChecker;
use chores::roster::Roster;
use chores::rotation::RotationSelector;
use chores::{StoreError, TaskStore, ToggleOutcome};
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use chores_proto::resident::{Assignee, Resident};
use chores_proto::task::{Recurrence, TaskDefinition, TaskId, TaskInstance, TaskTitle};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Instant `n` days after the rotation epoch.
fn day(n: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + TimeDelta::days(n)
}

fn roster(names: &[&str]) -> Roster {
    Roster::new(names.iter().map(|n| Resident::new(*n)).collect()).unwrap()
}

fn definition(id: u32, title: TaskTitle, recurrence: Recurrence, pair: bool) -> TaskDefinition {
    TaskDefinition {
        id: TaskId(id),
        title,
        recurrence,
        area: "House".to_string(),
        order: id,
        requires_pair: pair,
    }
}

/// A store holding exactly `task`, restored at `now`.
fn store_with(roster: Roster, def: TaskDefinition, task: TaskInstance, now: DateTime<Utc>) -> TaskStore {
    let mut store = TaskStore::new(vec![def], roster, Calendar::utc()).unwrap();
    store.restore(vec![task], vec![], now).unwrap();
    store
}

// ---------------------------------------------------------------------------
// Weekly rotation without override
// ---------------------------------------------------------------------------

#[test]
fn week_ten_of_three_residents_is_second_resident() {
    let roster = roster(&["A", "B", "C"]);
    let calendar = Calendar::utc();
    let selector = RotationSelector::new(&roster, &calendar);

    assert_eq!(
        selector.by_index(TaskTitle::LeftBathroom, 10),
        Ok(Assignee::single("B"))
    );
    assert_eq!(
        selector.for_period(TaskTitle::LeftBathroom, Recurrence::Weekly, day(70)),
        Ok(Assignee::single("B"))
    );
}

#[test]
fn on_time_completion_advances_deadline_from_old_deadline() {
    let def = definition(1, TaskTitle::LeftBathroom, Recurrence::Weekly, false);
    let task = TaskInstance::new(&def, Assignee::single("B"), day(63), day(70));
    let mut store = store_with(roster(&["A", "B", "C"]), def, task, day(69));

    let outcome = store
        .toggle(TaskId(1), "B", &AssigneeAuthorizer, day(69))
        .unwrap();
    let ToggleOutcome::Completed { task, next } = outcome else {
        panic!("expected completion, got {outcome:?}");
    };
    assert!(task.completed);
    assert_eq!(task.was_late, Some(false));
    assert_eq!(task.completed_at, Some(day(69)));
    assert_eq!(next.deadline, day(77));
    assert_eq!(next.assigned_to, Assignee::single("C"));
}

#[test]
fn late_completion_advances_deadline_from_now() {
    let def = definition(1, TaskTitle::LeftBathroom, Recurrence::Weekly, false);
    let task = TaskInstance::new(&def, Assignee::single("C"), day(63), day(70));
    let mut store = store_with(roster(&["A", "B", "C"]), def, task, day(72));

    let outcome = store
        .toggle(TaskId(1), "c", &AssigneeAuthorizer, day(72))
        .unwrap();
    let ToggleOutcome::Completed { task, next } = outcome else {
        panic!("expected completion, got {outcome:?}");
    };
    assert_eq!(task.was_late, Some(true));
    assert_eq!(next.deadline, day(79));
    assert_eq!(next.assigned_to, Assignee::single("A"));
}

// ---------------------------------------------------------------------------
// Pair rotation
// ---------------------------------------------------------------------------

#[test]
fn pair_successor_wraps_around() {
    let roster = roster(&["A", "B", "C", "D"])
        .with_override(
            TaskTitle::GroceryRun,
            vec![Assignee::pair("A", "B"), Assignee::pair("C", "D")],
        )
        .unwrap();
    let def = definition(6, TaskTitle::GroceryRun, Recurrence::Weekly, true);

    let first = TaskInstance::new(&def, Assignee::pair("A", "B"), day(0), day(7));
    let mut store = store_with(roster.clone(), def.clone(), first, day(1));
    let ToggleOutcome::Completed { next, .. } = store
        .toggle(TaskId(6), "B", &AssigneeAuthorizer, day(1))
        .unwrap()
    else {
        panic!("expected completion");
    };
    assert_eq!(next.assigned_to, Assignee::pair("C", "D"));

    let second = TaskInstance::new(&def, Assignee::pair("C", "D"), day(7), day(14));
    let mut store = store_with(roster, def, second, day(8));
    let ToggleOutcome::Completed { next, .. } = store
        .toggle(TaskId(6), "C", &AssigneeAuthorizer, day(8))
        .unwrap()
    else {
        panic!("expected completion");
    };
    assert_eq!(next.assigned_to, Assignee::pair("A", "B"));
}

#[test]
fn pair_member_outside_assignment_is_rejected() {
    let roster = roster(&["A", "B", "C", "D"])
        .with_override(
            TaskTitle::GroceryRun,
            vec![Assignee::pair("A", "B"), Assignee::pair("C", "D")],
        )
        .unwrap();
    let def = definition(6, TaskTitle::GroceryRun, Recurrence::Weekly, true);
    let task = TaskInstance::new(&def, Assignee::pair("A", "B"), day(0), day(7));
    let mut store = store_with(roster, def, task, day(1));
    let before = store.tasks().to_vec();

    let result = store.toggle(TaskId(6), "D", &AssigneeAuthorizer, day(1));
    assert_eq!(
        result,
        Err(StoreError::Unauthorized {
            task_id: TaskId(6),
            requester: "D".to_string(),
        })
    );
    assert_eq!(store.tasks(), before.as_slice());
}

// ---------------------------------------------------------------------------
// Monthly rollover
// ---------------------------------------------------------------------------

#[test]
fn monthly_rollover_resets_and_advances_one_step() {
    let roster = roster(&["A", "B", "C"]);
    let def = definition(5, TaskTitle::Fridge, Recurrence::Monthly, false);
    let jan_31 = Utc.with_ymd_and_hms(2024, 1, 31, 20, 0, 0).unwrap();
    let feb_1 = Utc.with_ymd_and_hms(2024, 2, 1, 0, 5, 0).unwrap();

    // Completed by A during January.
    let task = TaskInstance::new(&def, Assignee::single("A"), day(0), day(31));
    let mut store = store_with(roster.clone(), def.clone(), task, jan_31);
    store
        .toggle(TaskId(5), "A", &AssigneeAuthorizer, jan_31)
        .unwrap();
    let mut checker = RolloverChecker::new(Some(jan_31));
    let report = checker.check(&mut store, feb_1).unwrap();
    assert_eq!(report.monthly, vec![TaskId(5)]);
    let rolled = store.task(TaskId(5)).unwrap();
    assert!(!rolled.completed);
    assert_eq!(rolled.completed_at, None);
    assert_eq!(rolled.was_late, None);
    assert_eq!(rolled.assigned_to, Assignee::single("B"));
    assert_eq!(rolled.created_at, feb_1);
    // Queued deadline: one month after the Feb 1 deadline.
    assert_eq!(
        rolled.deadline,
        Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap())
    );

    // Never completed by B during February: still advances exactly once.
    let mar_1 = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
    let report = checker.check(&mut store, mar_1).unwrap();
    assert_eq!(report.monthly, vec![TaskId(5)]);
    let rolled = store.task(TaskId(5)).unwrap();
    assert!(!rolled.completed);
    assert_eq!(rolled.assigned_to, Assignee::single("C"));
}

#[test]
fn daily_rollover_leaves_incomplete_task_alone() {
    let def = definition(4, TaskTitle::TakeOutTrash, Recurrence::Daily, false);
    let task = TaskInstance::new(&def, Assignee::single("A"), day(10), day(11));
    let mut store = store_with(roster(&["A", "B", "C"]), def, task, day(10));
    let before = store.task(TaskId(4)).unwrap().clone();

    let mut checker = RolloverChecker::new(Some(day(10)));
    let report = checker.check(&mut store, day(11) + TimeDelta::hours(1)).unwrap();
    assert!(report.boundaries.day);
    assert!(report.daily.is_empty());
    assert_eq!(store.task(TaskId(4)), Some(&before));
    assert!(store.task(TaskId(4)).unwrap().is_overdue(day(12)));
}

#[test]
fn weekly_rollover_assigns_by_new_week_index() {
    let def = definition(1, TaskTitle::LeftBathroom, Recurrence::Weekly, false);
    let task = TaskInstance::new(&def, Assignee::single("B"), day(63), day(70));
    let mut store = store_with(roster(&["A", "B", "C"]), def, task, day(69));
    store
        .toggle(TaskId(1), "B", &AssigneeAuthorizer, day(69))
        .unwrap();

    // Day 70 is the Monday starting week 10.
    let mut checker = RolloverChecker::new(Some(day(69)));
    let report = checker.check(&mut store, day(70)).unwrap();
    assert_eq!(report.weekly, vec![TaskId(1)]);
    let rolled = store.task(TaskId(1)).unwrap();
    assert_eq!(rolled.assigned_to, Assignee::single("B"));
    assert_eq!(rolled.deadline, Some(day(77)));
    assert!(store.queued(TaskId(1)).is_none());
}

#[test]
fn mid_week_epoch_rolls_to_next_resident_on_monday() {
    let epoch = chrono::NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
    let calendar = Calendar::new(chrono::Offset::fix(&Utc), epoch);
    let def = definition(1, TaskTitle::LeftBathroom, Recurrence::Weekly, false);
    let wednesday = Utc.with_ymd_and_hms(2024, 1, 3, 10, 0, 0).unwrap();
    let friday = Utc.with_ymd_and_hms(2024, 1, 5, 10, 0, 0).unwrap();
    let monday = Utc.with_ymd_and_hms(2024, 1, 8, 0, 0, 0).unwrap();

    let mut store = TaskStore::new(vec![def], roster(&["A", "B", "C"]), calendar).unwrap();
    store.initialize(wednesday).unwrap();
    assert_eq!(store.task(TaskId(1)).unwrap().assigned_to, Assignee::single("A"));
    store
        .toggle(TaskId(1), "A", &AssigneeAuthorizer, friday)
        .unwrap();

    let mut checker = RolloverChecker::new(Some(friday));
    let report = checker.check(&mut store, monday).unwrap();
    assert_eq!(report.weekly, vec![TaskId(1)]);
    assert_eq!(store.task(TaskId(1)).unwrap().assigned_to, Assignee::single("B"));
}
