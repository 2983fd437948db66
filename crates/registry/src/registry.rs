//! The room registry.
//!
//! The set of rooms is fixed when the registry is built; only occupancy,
//! status and `last_update` change afterwards.
//!
//! Each room holds an immutable `Arc<Room>` snapshot behind its own lock.
//! A reader clones the `Arc` and releases the lock, so it never waits for
//! an apply's validation or allocation, only for another thread's pointer
//! swap. `apply` builds the next snapshot outside the lock and commits it
//! only if the room has not changed in the meantime, retrying otherwise.
//! Readers therefore always see a fully committed room.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;

use roomwatch_core::error::ConfigError;
use roomwatch_core::room::{Room, RoomConfig, OCCUPANCY_SOFT_CEILING};
use roomwatch_core::status::{RoomStatus, StatusPolicy};
use roomwatch_core::types::{RoomId, Timestamp};

use crate::error::RegistryError;

// ---------------------------------------------------------------------------
// Update / outcome types
// ---------------------------------------------------------------------------

/// A candidate occupancy update for one room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OccupancyUpdate {
    pub occupancy: u32,
    pub status: RoomStatus,
    pub timestamp: Timestamp,
}

/// Result of an [`RoomRegistry::apply`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
    /// The update was committed. Carries the new snapshot.
    Applied(Room),
    /// Same timestamp and values as the current state; nothing changed.
    Duplicate(Room),
    /// Older than the current `last_update`; discarded.
    Stale { current: Room },
}

impl ApplyOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    /// The room as it stands after the call.
    pub fn room(&self) -> &Room {
        match self {
            Self::Applied(room) | Self::Duplicate(room) => room,
            Self::Stale { current } => current,
        }
    }
}

/// Per-room apply counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyStats {
    pub applied: u64,
    pub duplicates: u64,
    pub stale: u64,
}

impl ApplyStats {
    pub fn total(&self) -> u64 {
        self.applied + self.duplicates + self.stale
    }
}

/// Occupancy overview across all rooms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RegistrySummary {
    pub total: usize,
    pub available: usize,
    pub occupied: usize,
    pub full: usize,
    pub stale: usize,
}

// ---------------------------------------------------------------------------
// RoomRegistry
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct RoomState {
    room: Arc<Room>,
    stats: ApplyStats,
}

/// What an update does to the snapshot it was judged against.
enum Verdict {
    Stale,
    Duplicate,
    Commit(Arc<Room>),
}

/// Shared store of current room state.
///
/// Designed to be wrapped in `Arc` and shared between sampling loops
/// (writers) and any number of readers.
#[derive(Debug)]
pub struct RoomRegistry {
    rooms: HashMap<RoomId, RwLock<RoomState>>,
    /// Configuration order, used by [`list`](Self::list).
    order: Vec<RoomId>,
    policy: StatusPolicy,
}

impl RoomRegistry {
    /// Build a registry from a room set, failing on the first invalid room.
    pub fn new(configs: &[RoomConfig], policy: StatusPolicy) -> Result<Self, ConfigError> {
        let mut builder = Self::builder(policy);
        for config in configs {
            builder.add(config)?;
        }
        Ok(builder.build())
    }

    /// Start an incremental build, letting the caller skip invalid rooms.
    pub fn builder(policy: StatusPolicy) -> RegistryBuilder {
        RegistryBuilder {
            policy,
            rooms: Vec::new(),
            seen: HashSet::new(),
        }
    }

    pub fn policy(&self) -> StatusPolicy {
        self.policy
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, room_id: &str) -> bool {
        self.rooms.contains_key(room_id)
    }

    /// Room ids in configuration order.
    pub fn room_ids(&self) -> &[RoomId] {
        &self.order
    }

    /// Atomically apply an occupancy update to one room.
    ///
    /// - Unknown room -> [`RegistryError::UnknownRoom`].
    /// - Occupancy above the soft ceiling, or a status that disagrees with
    ///   the policy for this room's capacity, is rejected without change.
    /// - A timestamp older than the current `last_update` is discarded
    ///   ([`ApplyOutcome::Stale`]).
    /// - An identical re-delivery is reported as [`ApplyOutcome::Duplicate`].
    pub fn apply(
        &self,
        room_id: &str,
        update: OccupancyUpdate,
    ) -> Result<ApplyOutcome, RegistryError> {
        let lock = self
            .rooms
            .get(room_id)
            .ok_or_else(|| RegistryError::UnknownRoom(room_id.to_string()))?;

        if update.occupancy > OCCUPANCY_SOFT_CEILING {
            return Err(RegistryError::OccupancyAboveCeiling {
                room_id: room_id.to_string(),
                occupancy: update.occupancy,
                ceiling: OCCUPANCY_SOFT_CEILING,
            });
        }

        loop {
            let current = snapshot(lock);

            let expected = self.policy.derive_status(update.occupancy, current.capacity);
            if update.status != expected {
                return Err(RegistryError::InconsistentStatus {
                    room_id: room_id.to_string(),
                    supplied: update.status,
                    expected,
                });
            }

            let verdict = match current.last_update {
                Some(ts) if update.timestamp < ts => Verdict::Stale,
                Some(ts)
                    if update.timestamp == ts
                        && update.occupancy == current.occupancy
                        && update.status == current.status =>
                {
                    Verdict::Duplicate
                }
                _ => {
                    let mut next = Room::clone(&current);
                    next.occupancy = update.occupancy;
                    next.status = update.status;
                    next.last_update = Some(update.timestamp);
                    Verdict::Commit(Arc::new(next))
                }
            };

            let mut state = write(lock);
            if !Arc::ptr_eq(&state.room, &current) {
                // Another apply committed since the snapshot; judge again.
                continue;
            }
            return Ok(match verdict {
                Verdict::Stale => {
                    state.stats.stale += 1;
                    drop(state);
                    tracing::debug!(
                        room_id,
                        update_ts = %update.timestamp,
                        current_ts = ?current.last_update,
                        "Discarding stale room update"
                    );
                    ApplyOutcome::Stale {
                        current: Room::clone(&current),
                    }
                }
                Verdict::Duplicate => {
                    state.stats.duplicates += 1;
                    drop(state);
                    ApplyOutcome::Duplicate(Room::clone(&current))
                }
                Verdict::Commit(next) => {
                    let previous = std::mem::replace(&mut state.room, Arc::clone(&next));
                    state.stats.applied += 1;
                    drop(state);
                    drop(previous);
                    ApplyOutcome::Applied(Room::clone(&next))
                }
            });
        }
    }

    /// Snapshot of one room.
    pub fn get(&self, room_id: &str) -> Result<Room, RegistryError> {
        self.rooms
            .get(room_id)
            .map(|lock| Room::clone(&snapshot(lock)))
            .ok_or_else(|| RegistryError::NotFound(room_id.to_string()))
    }

    /// Snapshot of every room, in configuration order.
    ///
    /// Each room is individually consistent; rooms are not captured at a
    /// single common instant.
    pub fn list(&self) -> Vec<Room> {
        self.order
            .iter()
            .filter_map(|id| self.rooms.get(id))
            .map(|lock| Room::clone(&snapshot(lock)))
            .collect()
    }

    /// Apply counters for one room.
    pub fn stats(&self, room_id: &str) -> Result<ApplyStats, RegistryError> {
        self.rooms
            .get(room_id)
            .map(|lock| read(lock).stats)
            .ok_or_else(|| RegistryError::NotFound(room_id.to_string()))
    }

    /// Ids of rooms without an accepted update within `max_age` of `now`.
    pub fn stale_rooms(&self, now: Timestamp, max_age: chrono::Duration) -> Vec<RoomId> {
        self.list()
            .into_iter()
            .filter(|room| room.is_stale(now, max_age))
            .map(|room| room.id)
            .collect()
    }

    /// Status counts across all rooms.
    pub fn summary(&self, now: Timestamp, max_age: chrono::Duration) -> RegistrySummary {
        let mut summary = RegistrySummary::default();
        for room in self.list() {
            summary.total += 1;
            match room.status {
                RoomStatus::Available => summary.available += 1,
                RoomStatus::Occupied => summary.occupied += 1,
                RoomStatus::Full => summary.full += 1,
            }
            if room.is_stale(now, max_age) {
                summary.stale += 1;
            }
        }
        summary
    }
}

/// The committed room, holding the lock only for the `Arc` clone.
fn snapshot(lock: &RwLock<RoomState>) -> Arc<Room> {
    Arc::clone(&read(lock).room)
}

/// Lock helpers. Nothing under a room lock can panic halfway through a
/// commit, so poisoning is ignored.
fn read(lock: &RwLock<RoomState>) -> RwLockReadGuard<'_, RoomState> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write(lock: &RwLock<RoomState>) -> RwLockWriteGuard<'_, RoomState> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// RegistryBuilder
// ---------------------------------------------------------------------------

/// Incremental registry construction.
pub struct RegistryBuilder {
    policy: StatusPolicy,
    rooms: Vec<Room>,
    seen: HashSet<RoomId>,
}

impl RegistryBuilder {
    /// Validate and add one room. On error the room is not added and the
    /// builder stays usable.
    pub fn add(&mut self, config: &RoomConfig) -> Result<(), ConfigError> {
        if self.seen.contains(&config.id) {
            return Err(ConfigError::DuplicateRoomId(config.id.clone()));
        }
        let room = Room::from_config(config, &self.policy)?;
        self.seen.insert(room.id.clone());
        self.rooms.push(room);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    pub fn build(self) -> RoomRegistry {
        let order = self.rooms.iter().map(|r| r.id.clone()).collect();
        let rooms = self
            .rooms
            .into_iter()
            .map(|room| {
                (
                    room.id.clone(),
                    RwLock::new(RoomState {
                        room: Arc::new(room),
                        stats: ApplyStats::default(),
                    }),
                )
            })
            .collect();
        RoomRegistry {
            rooms,
            order,
            policy: self.policy,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
