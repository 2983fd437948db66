//! Room update fan-out to WebSocket subscribers.
//!
//! [`FeedBroadcaster`] drains a [`RoomFeed`] and pushes every event to all
//! connected clients. Pushing only enqueues onto per-connection channels,
//! so a slow client never holds up the feed or the sampling loops.

use std::sync::Arc;

use roomwatch_events::RoomFeed;
use tokio_util::sync::CancellationToken;

use crate::ws::{FeedMessage, WsManager};

pub struct FeedBroadcaster {
    ws_manager: Arc<WsManager>,
}

impl FeedBroadcaster {
    pub fn new(ws_manager: Arc<WsManager>) -> Self {
        Self { ws_manager }
    }

    /// Forward events until `cancel` fires or the feed closes.
    pub async fn run(self, mut feed: RoomFeed, cancel: CancellationToken) {
        loop {
            let event = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                next = feed.next() => match next {
                    Some(event) => event,
                    None => {
                        tracing::info!("Event bus closed, feed broadcaster shutting down");
                        break;
                    }
                },
            };

            match FeedMessage::RoomUpdated(event).to_message() {
                Ok(message) => self.ws_manager.broadcast(message).await,
                Err(e) => tracing::error!(error = %e, "Failed to encode room update"),
            }
        }
        tracing::info!("Feed broadcaster stopped");
    }
}
