//! Room update events fanned out to subscribers.

use serde::{Deserialize, Serialize};

use crate::room::Room;
use crate::status::RoomStatus;
use crate::types::{RoomId, Timestamp};

/// Where an accepted update came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateSource {
    /// A sampling loop cycle.
    Sampled,
    /// A manual occupancy override.
    Override,
    /// Re-emitted from a registry snapshot after a subscriber fell behind.
    Resync,
}

/// One accepted room update.
///
/// Subscribers may see duplicates and out-of-order events and must apply
/// them last-writer-wins by `timestamp`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomUpdateEvent {
    pub room_id: RoomId,
    pub occupancy: u32,
    pub status: RoomStatus,
    pub timestamp: Timestamp,
    pub source: UpdateSource,
}

impl RoomUpdateEvent {
    /// Build an event from a committed room snapshot.
    ///
    /// Returns `None` for a room that has never been updated, since there is
    /// no timestamp to order it by.
    pub fn from_room(room: &Room, source: UpdateSource) -> Option<Self> {
        let timestamp = room.last_update?;
        Some(Self {
            room_id: room.id.clone(),
            occupancy: room.occupancy,
            status: room.status,
            timestamp,
            source,
        })
    }
}
