use roomwatch_core::status::RoomStatus;
use roomwatch_core::types::RoomId;

/// Errors returned by [`RoomRegistry`](crate::RoomRegistry) operations.
///
/// None of these are fatal to a sampling loop; callers log and move on.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    /// An update targeted a room that was never registered.
    #[error("Unknown room: {0}")]
    UnknownRoom(RoomId),

    /// A lookup targeted a room that was never registered.
    #[error("Room not found: {0}")]
    NotFound(RoomId),

    /// The supplied status disagrees with the status policy.
    #[error("Status {supplied} for room {room_id} is inconsistent with policy (expected {expected})")]
    InconsistentStatus {
        room_id: RoomId,
        supplied: RoomStatus,
        expected: RoomStatus,
    },

    /// The occupancy exceeds the soft ceiling.
    #[error("Occupancy {occupancy} for room {room_id} exceeds the ceiling {ceiling}")]
    OccupancyAboveCeiling {
        room_id: RoomId,
        occupancy: u32,
        ceiling: u32,
    },
}
