//! Rooms and their static configuration.
//!
//! A [`Room`] is created once at startup from a [`RoomConfig`] and lives for
//! the whole process. Its occupancy fields are only ever changed by the
//! registry's atomic apply; this module just defines the shape and the
//! construction-time validation.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::status::{RoomStatus, StatusPolicy};
use crate::types::{RoomId, Timestamp};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Upper bound on any recorded occupancy. Capacity is advisory and may be
/// exceeded, but counts above this are treated as detector noise.
pub const OCCUPANCY_SOFT_CEILING: u32 = 1000;

// ---------------------------------------------------------------------------
// SamplingMode
// ---------------------------------------------------------------------------

/// Which sampling context feeds a room.
///
/// `Live` rooms are sampled from video frames at the live cadence;
/// `Ambient` rooms follow a simulated random walk at the slower ambient
/// cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SamplingMode {
    #[default]
    Live,
    Ambient,
}

// ---------------------------------------------------------------------------
// Room
// ---------------------------------------------------------------------------

/// Current state of a monitored room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    pub capacity: u32,
    pub occupancy: u32,
    pub status: RoomStatus,
    /// Timestamp of the most recent accepted update; `None` until the first one.
    pub last_update: Option<Timestamp>,
    pub equipment: Vec<String>,
    pub video_feed: Option<String>,
    pub sampling_mode: SamplingMode,
}

impl Room {
    /// Build the initial room state from a validated configuration.
    pub fn from_config(config: &RoomConfig, policy: &StatusPolicy) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            id: config.id.clone(),
            name: config.name.clone(),
            capacity: config.capacity,
            occupancy: config.occupancy,
            status: policy.derive_status(config.occupancy, config.capacity),
            last_update: None,
            equipment: config.equipment.clone(),
            video_feed: config.video_feed.clone(),
            sampling_mode: config.sampling_mode,
        })
    }

    /// Whether the room has gone without an accepted update for longer than
    /// `max_age`. A room that was never updated is stale.
    pub fn is_stale(&self, now: Timestamp, max_age: chrono::Duration) -> bool {
        match self.last_update {
            Some(at) => now.signed_duration_since(at) > max_age,
            None => true,
        }
    }
}

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Static configuration for one room, as read from the rooms file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomConfig {
    pub id: RoomId,
    pub name: String,
    pub capacity: u32,
    /// Seed occupancy before the first sample arrives.
    #[serde(default)]
    pub occupancy: u32,
    #[serde(default)]
    pub equipment: Vec<String>,
    #[serde(default)]
    pub video_feed: Option<String>,
    #[serde(default)]
    pub sampling_mode: SamplingMode,
}

impl RoomConfig {
    /// Validate a single room.
    ///
    /// Rules:
    /// - The id must not be empty.
    /// - Capacity must be at least 1 and at most [`OCCUPANCY_SOFT_CEILING`].
    /// - The seed occupancy must not exceed [`OCCUPANCY_SOFT_CEILING`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.id.trim().is_empty() {
            return Err(ConfigError::EmptyRoomId);
        }
        if self.capacity == 0 {
            return Err(ConfigError::InvalidCapacity {
                room_id: self.id.clone(),
                capacity: self.capacity,
            });
        }
        if self.capacity > OCCUPANCY_SOFT_CEILING {
            return Err(ConfigError::CapacityAboveCeiling {
                room_id: self.id.clone(),
                capacity: self.capacity,
                ceiling: OCCUPANCY_SOFT_CEILING,
            });
        }
        if self.occupancy > OCCUPANCY_SOFT_CEILING {
            return Err(ConfigError::OccupancyAboveCeiling {
                room_id: self.id.clone(),
                occupancy: self.occupancy,
                ceiling: OCCUPANCY_SOFT_CEILING,
            });
        }
        Ok(())
    }
}

/// Validate a whole room set: every room individually plus id uniqueness.
pub fn validate_room_set(configs: &[RoomConfig]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for config in configs {
        config.validate()?;
        if !seen.insert(config.id.as_str()) {
            return Err(ConfigError::DuplicateRoomId(config.id.clone()));
        }
    }
    Ok(())
}

/// Parse a JSON array of room configurations.
pub fn parse_room_configs(json: &str) -> Result<Vec<RoomConfig>, ConfigError> {
    serde_json::from_str(json).map_err(|e| ConfigError::RoomsFile(e.to_string()))
}

/// The built-in five-room layout used when no rooms file is configured.
pub fn default_rooms() -> Vec<RoomConfig> {
    fn room(
        id: &str,
        name: &str,
        capacity: u32,
        equipment: &[&str],
        feed: &str,
        sampling_mode: SamplingMode,
    ) -> RoomConfig {
        RoomConfig {
            id: id.to_string(),
            name: name.to_string(),
            capacity,
            occupancy: 0,
            equipment: equipment.iter().map(|e| e.to_string()).collect(),
            video_feed: Some(feed.to_string()),
            sampling_mode,
        }
    }

    vec![
        room(
            "room-1",
            "Conference Room A",
            12,
            &["Projector", "Whiteboard", "Video Conferencing"],
            "meeting_room_1.mp4",
            SamplingMode::Live,
        ),
        room(
            "room-2",
            "Meeting Room B",
            8,
            &["TV Screen", "Whiteboard"],
            "meeting_room_2.mp4",
            SamplingMode::Live,
        ),
        room(
            "room-3",
            "Collaboration Space",
            6,
            &["Interactive Display", "Comfortable Seating"],
            "meeting_room_3.mp4",
            SamplingMode::Ambient,
        ),
        room(
            "room-4",
            "Executive Boardroom",
            16,
            &["Large Conference Table", "Premium AV Setup", "Video Conferencing"],
            "meeting_room_4.mp4",
            SamplingMode::Ambient,
        ),
        room(
            "room-5",
            "Training Room",
            20,
            &["Projector", "Sound System", "Flexible Seating"],
            "meeting_room_5.mp4",
            SamplingMode::Ambient,
        ),
    ]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
