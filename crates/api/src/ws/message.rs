use axum::extract::ws::Message;
use roomwatch_core::event::RoomUpdateEvent;
use roomwatch_core::room::Room;
use serde::Serialize;

/// JSON messages pushed to feed subscribers.
///
/// ```text
/// {"type":"rooms.snapshot","rooms":[...]}            sent once on connect
/// {"type":"room.updated","roomId":...,"occupancy":...,"status":...,"timestamp":...,"source":...}
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum FeedMessage {
    #[serde(rename = "rooms.snapshot")]
    Snapshot { rooms: Vec<Room> },
    #[serde(rename = "room.updated")]
    RoomUpdated(RoomUpdateEvent),
}

impl FeedMessage {
    /// Encode as a text frame.
    pub fn to_message(&self) -> Result<Message, serde_json::Error> {
        Ok(Message::Text(serde_json::to_string(self)?.into()))
    }
}
