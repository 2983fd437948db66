//! Most recent frame per room, for the "current frame" endpoint.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use roomwatch_core::types::RoomId;
use roomwatch_detector::Frame;

#[derive(Default)]
pub struct FrameCache {
    frames: RwLock<HashMap<RoomId, Frame>>,
}

impl FrameCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self, room_id: &str, frame: Frame) {
        self.frames
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(room_id.to_string(), frame);
    }

    pub fn latest(&self, room_id: &str) -> Option<Frame> {
        self.frames
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(room_id)
            .cloned()
    }
}
