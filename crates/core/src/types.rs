/// Stable room identifier, e.g. `"room-1"`. Unique within a registry.
pub type RoomId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
