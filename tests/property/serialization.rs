//! Property-based tests for the board document codec.
//!
//! Uses proptest to verify:
//! 1. Any valid `BoardSnapshot` survives encode → decode.
//! 2. Random bytes never cause a panic in `decode` (returns `Err` gracefully).
//! 3. A version byte outside the supported range is always rejected.
//! 4. Task instances survive a JSON round trip with their deadlines intact.

#![allow(clippy::unwrap_used)]

use chores_proto::codec::{
    self, BoardSnapshot, CodecError, MIN_SNAPSHOT_VERSION, SNAPSHOT_VERSION,
};
use chores_proto::credential::StoredCredential;
use chores_proto::laundry::{LaundryReservation, LaundrySlot};
use chores_proto::resident::{Assignee, Resident};
use chores_proto::task::{
    QueuedOccurrence, Recurrence, TaskDefinition, TaskId, TaskInstance, TaskTitle,
};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use proptest::prelude::*;

// --- strategies ---

fn arb_credential() -> impl Strategy<Value = StoredCredential> {
    ("[A-Za-z]{1,12}", "[0-9a-f]{64}")
        .prop_map(|(username, digest)| StoredCredential { username, digest })
}

fn arb_instant() -> impl Strategy<Value = DateTime<Utc>> {
    (946_684_800i64..4_102_444_800i64)
        .prop_map(|secs| Utc.timestamp_opt(secs, 0).single().unwrap_or_default())
}

fn arb_name() -> impl Strategy<Value = String> {
    "[A-Za-z]{1,12}"
}

fn arb_assignee() -> impl Strategy<Value = Assignee> {
    prop_oneof![
        arb_name().prop_map(|n| Assignee::Single(Resident::new(n))),
        (arb_name(), arb_name()).prop_map(|(a, b)| Assignee::Pair(Resident::new(a), Resident::new(b))),
    ]
}

fn arb_recurrence() -> impl Strategy<Value = Recurrence> {
    prop_oneof![
        Just(Recurrence::Daily),
        Just(Recurrence::Weekly),
        Just(Recurrence::Monthly),
    ]
}

fn arb_task() -> impl Strategy<Value = TaskInstance> {
    (
        0usize..TaskTitle::ALL.len(),
        arb_recurrence(),
        arb_assignee(),
        arb_instant(),
        arb_instant(),
        proptest::option::of((arb_instant(), any::<bool>())),
        any::<bool>(),
    )
        .prop_map(
            |(title, recurrence, assignee, created, deadline, completion, has_deadline)| {
                let definition = TaskDefinition {
                    id: TaskId(u32::try_from(title).unwrap() + 1),
                    title: TaskTitle::ALL[title],
                    recurrence,
                    area: "Area".to_string(),
                    order: u32::try_from(title).unwrap(),
                    requires_pair: assignee.is_pair(),
                };
                let mut task = TaskInstance::new(&definition, assignee, created, deadline);
                if !has_deadline {
                    task.deadline = None;
                }
                if let Some((at, late)) = completion {
                    task.mark_completed(at, late);
                }
                task
            },
        )
}

fn arb_reservation() -> impl Strategy<Value = LaundryReservation> {
    (arb_name(), 0u32..3650, any::<bool>()).prop_map(|(name, offset, morning)| {
        LaundryReservation {
            resident: Resident::new(name),
            date: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .checked_add_days(chrono::Days::new(u64::from(offset)))
                .unwrap(),
            slot: if morning {
                LaundrySlot::Morning
            } else {
                LaundrySlot::Evening
            },
        }
    })
}

fn arb_snapshot() -> impl Strategy<Value = BoardSnapshot> {
    (
        prop::collection::vec(arb_task(), 0..8),
        prop::collection::vec((1u32..10, arb_assignee(), arb_instant()), 0..4),
        prop::collection::vec(arb_reservation(), 0..8),
        proptest::option::of(arb_instant()),
        prop::collection::vec(arb_credential(), 0..4),
    )
        .prop_map(
            |(tasks, queued, reservations, last_rollover_check, credentials)| {
                let queued = queued
                    .into_iter()
                    .map(|(id, assigned_to, deadline)| QueuedOccurrence {
                        task_id: TaskId(id),
                        assigned_to,
                        deadline,
                    })
                    .collect();
                BoardSnapshot {
                    tasks,
                    queued,
                    reservations,
                    last_rollover_check,
                    credentials,
                }
            },
        )
}

// --- properties ---

proptest! {
    #[test]
    fn snapshot_round_trip(snapshot in arb_snapshot()) {
        let bytes = codec::encode(&snapshot).unwrap();
        prop_assert_eq!(bytes[0], SNAPSHOT_VERSION);
        prop_assert_eq!(codec::decode(&bytes).unwrap(), snapshot);
    }

    #[test]
    fn random_bytes_never_panic(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
        let _ = codec::decode(&bytes);
    }

    #[test]
    fn foreign_version_rejected(version in any::<u8>(), snapshot in arb_snapshot()) {
        prop_assume!(!(MIN_SNAPSHOT_VERSION..=SNAPSHOT_VERSION).contains(&version));
        let mut bytes = codec::encode(&snapshot).unwrap();
        bytes[0] = version;
        let rejected = matches!(
            codec::decode(&bytes),
            Err(CodecError::UnsupportedVersion { found }) if found == version
        );
        prop_assert!(rejected);
    }

    #[test]
    fn task_json_round_trip(task in arb_task()) {
        let json = serde_json::to_string(&task).unwrap();
        let back: TaskInstance = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back, task);
    }
}
