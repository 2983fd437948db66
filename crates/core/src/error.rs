/// Domain-level errors surfaced to API callers.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Startup configuration errors.
///
/// A room whose configuration fails validation is never initialised; the
/// process decides whether the remaining rooms are enough to continue.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Room {room_id} has invalid capacity {capacity}: must be at least 1")]
    InvalidCapacity { room_id: String, capacity: u32 },

    #[error("Room {room_id} capacity {capacity} exceeds the occupancy ceiling {ceiling}")]
    CapacityAboveCeiling {
        room_id: String,
        capacity: u32,
        ceiling: u32,
    },

    #[error("Room {room_id} initial occupancy {occupancy} exceeds the occupancy ceiling {ceiling}")]
    OccupancyAboveCeiling {
        room_id: String,
        occupancy: u32,
        ceiling: u32,
    },

    #[error("Duplicate room id: {0}")]
    DuplicateRoomId(String),

    #[error("Room id must not be empty")]
    EmptyRoomId,

    #[error("Invalid value for {var}: {reason}")]
    InvalidEnv { var: &'static str, reason: String },

    #[error("Failed to load rooms file: {0}")]
    RoomsFile(String),

    #[error("No valid rooms configured")]
    NoValidRooms,
}
