//! Ambient occupancy simulation.
//!
//! Each tick moves a room's simulated head count by -1, 0 or +1, bounded by
//! `[0, capacity]`. The walk position is the detector's own model state; the
//! sampling loop and the registry never feed it back.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use roomwatch_core::detection::DetectionSample;

use crate::error::DetectionError;
use crate::sample::SampleRef;
use crate::Detector;

struct Walk {
    capacity: u32,
    position: u32,
}

/// Bounded random-walk detector for ambient rooms.
pub struct RandomWalkDetector {
    walks: Mutex<HashMap<String, Walk>>,
}

impl RandomWalkDetector {
    /// Build from `(room_id, capacity, starting_occupancy)` triples.
    pub fn new<I, S>(rooms: I) -> Self
    where
        I: IntoIterator<Item = (S, u32, u32)>,
        S: Into<String>,
    {
        let walks = rooms
            .into_iter()
            .map(|(id, capacity, start)| {
                (
                    id.into(),
                    Walk {
                        capacity,
                        position: start.min(capacity),
                    },
                )
            })
            .collect();
        Self {
            walks: Mutex::new(walks),
        }
    }

    /// Apply one step and return the new position.
    fn step(&self, room_id: &str, delta: i64) -> Result<u32, DetectionError> {
        let mut walks = self.walks.lock().unwrap_or_else(PoisonError::into_inner);
        let walk = walks.get_mut(room_id).ok_or_else(|| {
            DetectionError::Capture(format!("no ambient model for room {room_id}"))
        })?;
        let next = (i64::from(walk.position) + delta).clamp(0, i64::from(walk.capacity));
        walk.position = next as u32;
        Ok(walk.position)
    }
}

#[async_trait]
impl Detector for RandomWalkDetector {
    async fn detect(
        &self,
        room_id: &str,
        _sample: &SampleRef,
    ) -> Result<DetectionSample, DetectionError> {
        let delta = rand::rng().random_range(-1..=1);
        let count = self.step(room_id, delta)?;
        Ok(DetectionSample {
            room_id: room_id.to_string(),
            occupancy_count: count,
            boxes: Vec::new(),
            observed_at: Utc::now(),
        })
    }

    fn name(&self) -> &'static str {
        "random-walk"
    }
}
