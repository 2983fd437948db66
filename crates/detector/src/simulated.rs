//! Simulated person detector.
//!
//! Stands in for a real inference backend: after a short artificial latency
//! it reports a uniformly random person count and one plausible bounding
//! box per person.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use roomwatch_core::detection::{BoundingBox, DetectionSample};

use crate::error::DetectionError;
use crate::sample::SampleRef;
use crate::Detector;

/// Default simulated inference latency.
pub const DEFAULT_LATENCY: Duration = Duration::from_millis(100);

/// Exclusive upper bound on the simulated person count.
pub const DEFAULT_MAX_PEOPLE: u32 = 10;

/// Random-count detector.
#[derive(Debug, Clone)]
pub struct SimulatedDetector {
    latency: Duration,
    max_people: u32,
}

impl SimulatedDetector {
    pub fn new(latency: Duration, max_people: u32) -> Self {
        Self {
            latency,
            max_people: max_people.max(1),
        }
    }

    /// Generate a count and boxes. Kept synchronous so the thread-local RNG
    /// never lives across an await point.
    fn simulate(&self, room_id: &str) -> DetectionSample {
        let mut rng = rand::rng();
        let count = rng.random_range(0..self.max_people);
        let boxes = (0..count)
            .map(|_| BoundingBox {
                x: rng.random_range(0.0..400.0),
                y: rng.random_range(0.0..300.0),
                width: rng.random_range(60.0..100.0),
                height: rng.random_range(80.0..140.0),
                confidence: rng.random_range(0.7..1.0),
            })
            .collect();

        DetectionSample {
            room_id: room_id.to_string(),
            occupancy_count: count,
            boxes,
            observed_at: Utc::now(),
        }
    }
}

impl Default for SimulatedDetector {
    fn default() -> Self {
        Self::new(DEFAULT_LATENCY, DEFAULT_MAX_PEOPLE)
    }
}

#[async_trait]
impl Detector for SimulatedDetector {
    async fn detect(
        &self,
        room_id: &str,
        sample: &SampleRef,
    ) -> Result<DetectionSample, DetectionError> {
        if let Some(frame) = sample.frame() {
            frame.dimensions()?;
        }
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        Ok(self.simulate(room_id))
    }

    fn name(&self) -> &'static str {
        "simulated"
    }
}
