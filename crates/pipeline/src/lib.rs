//! Occupancy sampling pipeline.
//!
//! - [`RoomUpdater`] -- the single mutation path for room state: status
//!   policy, atomic registry apply, then publish.
//! - [`run_sampling_loop`] -- one room's repeating acquire/detect/apply cycle.
//! - [`SamplingManager`] -- per-room start/stop state machine and shutdown.

pub mod config;
pub mod error;
pub mod frames;
pub mod manager;
pub mod sampler;
pub mod updater;

pub use config::SamplingConfig;
pub use error::SamplingError;
pub use frames::FrameCache;
pub use manager::{LoopState, LoopStatus, SamplingManager, SamplingProfile};
pub use sampler::{run_sampling_loop, CycleOutcome, LoopContext};
pub use updater::RoomUpdater;
