//! Lag-tolerant subscription to room updates.
//!
//! A broadcast receiver that falls more than the buffer capacity behind
//! loses events. [`RoomFeed`] turns that loss into a resynchronisation: it
//! emits one synthetic [`UpdateSource::Resync`] event per room built from the
//! current registry snapshot, so a subscriber always converges on the latest
//! committed state. Consumers apply events last-writer-wins by timestamp, so
//! the resulting duplicates are harmless.

use std::collections::VecDeque;
use std::sync::Arc;

use roomwatch_core::event::{RoomUpdateEvent, UpdateSource};
use roomwatch_registry::RoomRegistry;
use tokio::sync::broadcast;

use crate::bus::EventBus;

pub struct RoomFeed {
    receiver: broadcast::Receiver<RoomUpdateEvent>,
    registry: Arc<RoomRegistry>,
    pending: VecDeque<RoomUpdateEvent>,
}

impl RoomFeed {
    pub fn new(bus: &EventBus, registry: Arc<RoomRegistry>) -> Self {
        Self {
            receiver: bus.subscribe(),
            registry,
            pending: VecDeque::new(),
        }
    }

    /// Wait for the next event. Returns `None` once the bus is gone.
    pub async fn next(&mut self) -> Option<RoomUpdateEvent> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(event);
            }
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Room feed lagged, resyncing from registry");
                    self.resync();
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Queue one event per room that has ever been updated.
    fn resync(&mut self) {
        self.pending.extend(
            self.registry
                .list()
                .iter()
                .filter_map(|room| RoomUpdateEvent::from_room(room, UpdateSource::Resync)),
        );
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
