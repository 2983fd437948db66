//! Detection capability and sample acquisition.
//!
//! The sampling pipeline treats "count the people in this sample" as an
//! opaque external capability. This crate defines that capability as the
//! [`Detector`] trait, the [`FrameSource`] trait that produces samples, and
//! the interchangeable implementations:
//!
//! - [`SimulatedDetector`] -- random person count with one box per person.
//! - [`RandomWalkDetector`] -- ambient simulation drifting by at most one
//!   person per tick.
//! - [`HttpDetector`] -- a remote inference endpoint.
//! - [`PlaceholderFrameSource`], [`DirectoryFrameSource`], [`TickSource`].

pub mod error;
pub mod http;
pub mod random_walk;
pub mod sample;
pub mod simulated;
pub mod source;

use async_trait::async_trait;
use roomwatch_core::detection::DetectionSample;

pub use error::DetectionError;
pub use http::HttpDetector;
pub use random_walk::RandomWalkDetector;
pub use sample::{Frame, SampleRef};
pub use simulated::SimulatedDetector;
pub use source::{DirectoryFrameSource, FrameSource, PlaceholderFrameSource, TickSource};

/// Runs person detection on one sample for one room.
///
/// Request/response only: implementations hold no room state the pipeline
/// depends on. Zero people is a successful result, never an error.
#[async_trait]
pub trait Detector: Send + Sync {
    /// Detect people in `sample`, attributing the result to `room_id`.
    async fn detect(
        &self,
        room_id: &str,
        sample: &SampleRef,
    ) -> Result<DetectionSample, DetectionError>;

    /// Short backend name for logs.
    fn name(&self) -> &'static str;
}
