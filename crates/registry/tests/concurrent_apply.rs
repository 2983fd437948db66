//! Concurrency tests for `RoomRegistry`.
//!
//! Many writers hammer the same registry while readers continuously take
//! snapshots. Every apply must be accounted for and no reader may ever see
//! a room whose status disagrees with its occupancy.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{Duration, Utc};
use roomwatch_core::room::{RoomConfig, SamplingMode};
use roomwatch_core::status::StatusPolicy;
use roomwatch_registry::{OccupancyUpdate, RoomRegistry};

const WRITERS: usize = 8;
const UPDATES_PER_WRITER: usize = 500;

fn shared_registry() -> Arc<RoomRegistry> {
    let rooms = vec![
        RoomConfig {
            id: "room-1".to_string(),
            name: "Conference Room A".to_string(),
            capacity: 12,
            occupancy: 0,
            equipment: vec![],
            video_feed: None,
            sampling_mode: SamplingMode::Live,
        },
        RoomConfig {
            id: "room-2".to_string(),
            name: "Meeting Room B".to_string(),
            capacity: 8,
            occupancy: 0,
            equipment: vec![],
            video_feed: None,
            sampling_mode: SamplingMode::Live,
        },
    ];
    Arc::new(RoomRegistry::new(&rooms, StatusPolicy::default()).unwrap())
}

// ---------------------------------------------------------------------------
// Test: N writers x M updates are all accounted for, with no torn reads
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_writers_and_readers() {
    let registry = shared_registry();
    let policy = registry.policy();
    let base = Utc::now();
    let done = Arc::new(AtomicBool::new(false));

    // Readers: every snapshot must be internally consistent.
    let mut readers = Vec::new();
    for _ in 0..2 {
        let registry = Arc::clone(&registry);
        let done = Arc::clone(&done);
        readers.push(tokio::task::spawn_blocking(move || {
            let mut observed = 0usize;
            while !done.load(Ordering::Relaxed) {
                for room in registry.list() {
                    assert_eq!(
                        room.status,
                        policy.derive_status(room.occupancy, room.capacity),
                        "torn read on {}",
                        room.id
                    );
                    observed += 1;
                }
            }
            observed
        }));
    }

    // Writers: each writer uses its own interleaved timestamp sequence so
    // that arrivals across writers are out of order.
    let mut writers = Vec::new();
    for writer in 0..WRITERS {
        let registry = Arc::clone(&registry);
        writers.push(tokio::task::spawn_blocking(move || {
            for i in 0..UPDATES_PER_WRITER {
                let room_id = if i % 2 == 0 { "room-1" } else { "room-2" };
                let capacity = if room_id == "room-1" { 12 } else { 8 };
                let occupancy = ((writer + i) % 15) as u32;
                let tick = (i * WRITERS + writer) as i64;
                let update = OccupancyUpdate {
                    occupancy,
                    status: policy.derive_status(occupancy, capacity),
                    timestamp: base + Duration::microseconds(tick),
                };
                registry.apply(room_id, update).unwrap();
            }
        }));
    }

    for writer in writers {
        writer.await.unwrap();
    }
    done.store(true, Ordering::Relaxed);
    for reader in readers {
        reader.await.unwrap();
    }

    let total: u64 = ["room-1", "room-2"]
        .iter()
        .map(|id| registry.stats(id).unwrap().total())
        .sum();
    assert_eq!(total, (WRITERS * UPDATES_PER_WRITER) as u64);

    // The final state of each room carries the maximum timestamp issued for it.
    let max_tick_room_1 = ((UPDATES_PER_WRITER - 2) * WRITERS + (WRITERS - 1)) as i64;
    let room_1 = registry.get("room-1").unwrap();
    assert_eq!(
        room_1.last_update,
        Some(base + Duration::microseconds(max_tick_room_1))
    );
}

// ---------------------------------------------------------------------------
// Test: lastUpdate never decreases under concurrent writers
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn last_update_is_monotonic() {
    let registry = shared_registry();
    let policy = registry.policy();
    let base = Utc::now();
    let done = Arc::new(AtomicBool::new(false));

    let watcher = {
        let registry = Arc::clone(&registry);
        let done = Arc::clone(&done);
        tokio::task::spawn_blocking(move || {
            let mut last = None;
            while !done.load(Ordering::Relaxed) {
                let room = registry.get("room-2").unwrap();
                assert!(room.last_update >= last, "last_update went backwards");
                last = room.last_update;
            }
        })
    };

    let mut writers = Vec::new();
    for writer in 0..4i64 {
        let registry = Arc::clone(&registry);
        writers.push(tokio::task::spawn_blocking(move || {
            // Each writer walks its own timestamps in reverse.
            for i in (0..300i64).rev() {
                let occupancy = (i % 9) as u32;
                registry
                    .apply(
                        "room-2",
                        OccupancyUpdate {
                            occupancy,
                            status: policy.derive_status(occupancy, 8),
                            timestamp: base + Duration::microseconds(i * 4 + writer),
                        },
                    )
                    .unwrap();
            }
        }));
    }

    for writer in writers {
        writer.await.unwrap();
    }
    done.store(true, Ordering::Relaxed);
    watcher.await.unwrap();

    assert_eq!(
        registry.get("room-2").unwrap().last_update,
        Some(base + Duration::microseconds(299 * 4 + 3))
    );
}
