//! Remote occupancy persistence sink.
//!
//! [`OccupancyPersistence`] consumes a [`RoomFeed`] and forwards each accepted
//! update to an external "persist occupancy" endpoint as
//! `PUT {url}` with body `{roomId, occupancy, status, timestamp}`. Delivery is
//! at-least-once with retry; the sink applies the same last-writer-wins rule
//! as the registry so duplicate or reordered events never overwrite newer
//! state remotely.

use std::collections::HashMap;
use std::time::Duration;

use roomwatch_core::event::RoomUpdateEvent;
use roomwatch_core::types::{RoomId, Timestamp};
use tokio_util::sync::CancellationToken;

use crate::feed::RoomFeed;

/// Retry delays (exponential backoff: 1s, 2s, 4s).
const RETRY_DELAYS: [Duration; 3] = [
    Duration::from_secs(1),
    Duration::from_secs(2),
    Duration::from_secs(4),
];

/// HTTP request timeout for a single delivery attempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// The underlying HTTP request failed (network, DNS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The remote endpoint returned a non-2xx status code.
    #[error("Persist endpoint returned HTTP {0}")]
    HttpStatus(u16),
}

// ---------------------------------------------------------------------------
// Last-writer-wins bookkeeping
// ---------------------------------------------------------------------------

/// The newest update already persisted for each room.
#[derive(Debug, Default)]
struct Watermarks {
    persisted: HashMap<RoomId, (Timestamp, u32)>,
}

impl Watermarks {
    /// Whether `event` would change what the remote side holds.
    fn is_newer(&self, event: &RoomUpdateEvent) -> bool {
        match self.persisted.get(&event.room_id) {
            None => true,
            Some(&(ts, occupancy)) => {
                event.timestamp > ts || (event.timestamp == ts && event.occupancy != occupancy)
            }
        }
    }

    fn record(&mut self, event: &RoomUpdateEvent) {
        self.persisted
            .insert(event.room_id.clone(), (event.timestamp, event.occupancy));
    }
}

// ---------------------------------------------------------------------------
// OccupancyPersistence
// ---------------------------------------------------------------------------

pub struct OccupancyPersistence {
    client: reqwest::Client,
    url: String,
    retry_delays: Vec<Duration>,
    watermarks: Watermarks,
}

impl OccupancyPersistence {
    pub fn new(url: impl Into<String>) -> Result<Self, PersistError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
            retry_delays: RETRY_DELAYS.to_vec(),
            watermarks: Watermarks::default(),
        })
    }

    /// Override the backoff schedule.
    pub fn with_retry_delays(mut self, delays: Vec<Duration>) -> Self {
        self.retry_delays = delays;
        self
    }

    /// Run the persistence loop until the feed closes or `cancel` fires.
    pub async fn run(mut self, mut feed: RoomFeed, cancel: CancellationToken) {
        tracing::info!(url = %self.url, "Occupancy persistence started");
        loop {
            let event = tokio::select! {
                _ = cancel.cancelled() => break,
                event = feed.next() => match event {
                    Some(event) => event,
                    None => break,
                },
            };

            if !self.watermarks.is_newer(&event) {
                tracing::debug!(room_id = %event.room_id, "Skipping already-persisted update");
                continue;
            }

            let delivered = tokio::select! {
                _ = cancel.cancelled() => break,
                result = self.deliver(&event) => result,
            };
            match delivered {
                Ok(()) => self.watermarks.record(&event),
                Err(e) => tracing::error!(
                    room_id = %event.room_id,
                    error = %e,
                    "Failed to persist occupancy"
                ),
            }
        }
        tracing::info!("Occupancy persistence shutting down");
    }

    /// Deliver one update, retrying with backoff before giving up.
    async fn deliver(&self, event: &RoomUpdateEvent) -> Result<(), PersistError> {
        let payload = serde_json::json!({
            "roomId": event.room_id,
            "occupancy": event.occupancy,
            "status": event.status,
            "timestamp": event.timestamp,
        });

        let mut last_err = match self.try_send(&payload).await {
            Ok(()) => return Ok(()),
            Err(e) => e,
        };

        for (attempt, delay) in self.retry_delays.iter().enumerate() {
            tracing::warn!(
                attempt = attempt + 1,
                room_id = %event.room_id,
                error = %last_err,
                "Persist attempt failed, retrying"
            );
            tokio::time::sleep(*delay).await;
            match self.try_send(&payload).await {
                Ok(()) => return Ok(()),
                Err(e) => last_err = e,
            }
        }

        Err(last_err)
    }

    /// Execute a single PUT request and check the response status.
    async fn try_send(&self, payload: &serde_json::Value) -> Result<(), PersistError> {
        let response = self.client.put(&self.url).json(payload).send().await?;
        if !response.status().is_success() {
            return Err(PersistError::HttpStatus(response.status().as_u16()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
