//! Board lifecycle against a real document file: open, toggle, roll over,
//! restart, keep changed passwords, and recover from a corrupted document.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;

use chores::auth::AssigneeAuthorizer;
use chores::clock::ManualClock;
use chores::config::HouseholdConfig;
use chores::persistence::{BoardPersistence, FilePersistence};
use chores::{Board, BoardError, StoreError, ToggleOutcome};
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use chores_proto::laundry::LaundrySlot;
use chores_proto::resident::Assignee;
use chores_proto::task::TaskId;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const TRASH: TaskId = TaskId(4);
const FRIDGE: TaskId = TaskId(5);

fn open(clock: &Arc<ManualClock>, persistence: &Arc<FilePersistence>) -> Board {
    let household = HouseholdConfig::default();
    Board::open(
        household.task_store().unwrap(),
        household.users().unwrap(),
        clock.clone(),
        Arc::new(AssigneeAuthorizer),
        persistence.clone(),
    )
    .unwrap()
}

fn assignee(board: &Board, id: TaskId) -> Assignee {
    board.store().task(id).unwrap().assigned_to.clone()
}

fn first_member(assignee: &Assignee) -> String {
    assignee.members()[0].to_string()
}

/// Tuesday afternoon, mid-month.
fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 14, 15, 0, 0).unwrap()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn first_open_writes_document() {
    let dir = tempfile::tempdir().unwrap();
    let persistence = Arc::new(FilePersistence::new(dir.path().join("board.bin")));
    let clock = Arc::new(ManualClock::new(start()));

    let board = open(&clock, &persistence);
    let saved = persistence.load().unwrap().unwrap();
    assert_eq!(saved, board.snapshot());
    assert_eq!(saved.tasks.len(), 6);
    assert_eq!(saved.last_rollover_check, Some(start()));
}

#[test]
fn completion_survives_restart_and_rolls_over_next_day() {
    let dir = tempfile::tempdir().unwrap();
    let persistence = Arc::new(FilePersistence::new(dir.path().join("board.bin")));
    let clock = Arc::new(ManualClock::new(start()));

    let mut board = open(&clock, &persistence);
    let today_owner = assignee(&board, TRASH);
    let outcome = board.toggle(TRASH, &first_member(&today_owner)).unwrap();
    let ToggleOutcome::Completed { next, .. } = outcome else {
        panic!("expected completion");
    };
    drop(board);

    // Restart the same evening: the completion and queued occurrence load.
    clock.advance(TimeDelta::hours(5));
    let board = open(&clock, &persistence);
    assert!(board.store().task(TRASH).unwrap().completed);
    assert_eq!(board.store().queued(TRASH), Some(&next));
    drop(board);

    // Restart the next morning: the missed daily rollover catches up.
    clock.advance(TimeDelta::hours(10));
    let board = open(&clock, &persistence);
    let trash = board.store().task(TRASH).unwrap();
    assert!(!trash.completed);
    assert_ne!(trash.assigned_to, today_owner);
    assert_eq!(trash.deadline, Some(next.deadline));
    assert!(board.store().queued(TRASH).is_none());

    let saved = persistence.load().unwrap().unwrap();
    assert_eq!(saved, board.snapshot());
}

#[test]
fn unauthorized_toggle_leaves_document_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("board.bin");
    let persistence = Arc::new(FilePersistence::new(&path));
    let clock = Arc::new(ManualClock::new(start()));

    let mut board = open(&clock, &persistence);
    let before = std::fs::read(&path).unwrap();

    let result = board.toggle(FRIDGE, "Edila");
    assert!(matches!(
        result,
        Err(BoardError::Store(StoreError::Unauthorized { .. }))
    ));
    let result = board.toggle(TaskId(404), "Lucas");
    assert!(matches!(
        result,
        Err(BoardError::Store(StoreError::NotFound(TaskId(404))))
    ));
    assert_eq!(std::fs::read(&path).unwrap(), before);
}

#[test]
fn ticker_style_checks_roll_over_monthly_task() {
    let dir = tempfile::tempdir().unwrap();
    let persistence = Arc::new(FilePersistence::new(dir.path().join("board.bin")));
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 5, 31, 23, 58, 0).unwrap(),
    ));

    let mut board = open(&clock, &persistence);
    let may_owner = assignee(&board, FRIDGE);

    clock.advance(TimeDelta::minutes(1));
    assert!(!board.check_rollover().unwrap().boundaries.any());

    clock.advance(TimeDelta::minutes(1));
    let report = board.check_rollover().unwrap();
    assert!(report.boundaries.month);
    assert_eq!(report.monthly, vec![FRIDGE]);
    assert_ne!(assignee(&board, FRIDGE), may_owner);

    let saved = persistence.load().unwrap().unwrap();
    let fridge = saved.tasks.iter().find(|t| t.id == FRIDGE).unwrap();
    assert_eq!(fridge.assigned_to, assignee(&board, FRIDGE));
}

#[test]
fn laundry_bookings_persist() {
    let dir = tempfile::tempdir().unwrap();
    let persistence = Arc::new(FilePersistence::new(dir.path().join("board.bin")));
    let clock = Arc::new(ManualClock::new(start()));

    let mut board = open(&clock, &persistence);
    let tomorrow = board.today().succ_opt().unwrap();
    board
        .reserve_laundry("Kelvin", tomorrow, LaundrySlot::Morning)
        .unwrap();
    drop(board);

    let board = open(&clock, &persistence);
    assert_eq!(board.laundry().reservations().len(), 1);
    assert_eq!(
        board
            .laundry()
            .holder(tomorrow, LaundrySlot::Morning)
            .map(ToString::to_string),
        Some("Kelvin".to_string())
    );
}

#[test]
fn corrupted_document_starts_fresh() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("board.bin");
    std::fs::write(&path, [1u8, 0xff, 0xff, 0xff]).unwrap();
    let persistence = Arc::new(FilePersistence::new(&path));
    let clock = Arc::new(ManualClock::new(start()));

    let board = open(&clock, &persistence);
    assert_eq!(board.tasks().len(), 6);
    assert!(board.completed().is_empty());
    assert!(dir.path().join("board.bin.corrupt").exists());
    assert_eq!(persistence.load().unwrap().unwrap(), board.snapshot());
}

#[test]
fn changed_password_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let persistence = Arc::new(FilePersistence::new(dir.path().join("board.bin")));
    let clock = Arc::new(ManualClock::new(start()));

    let mut board = open(&clock, &persistence);
    board.change_password("Kelvin", "123456", "laundry-day").unwrap();
    drop(board);

    clock.advance(TimeDelta::hours(2));
    let mut reopened = open(&clock, &persistence);
    let user = reopened.verify("kelvin", "laundry-day").unwrap();
    assert_eq!(user.username, "Kelvin");
    assert!(reopened.verify("Kelvin", "123456").is_err());
    assert!(reopened.verify("Natan", "123456").is_ok());

    // A later change replaces the saved digest rather than adding a second one.
    reopened
        .change_password("Kelvin", "laundry-day", "fresh-sheets")
        .unwrap();
    let saved = persistence.load().unwrap().unwrap();
    assert_eq!(saved.credentials.len(), 1);
    drop(reopened);

    let third = open(&clock, &persistence);
    assert!(third.verify("Kelvin", "fresh-sheets").is_ok());
    assert!(third.verify("Kelvin", "laundry-day").is_err());
}
