//! In-memory room state store.
//!
//! - [`RoomRegistry`] exclusively owns the live state of every room and
//!   applies occupancy updates atomically, last-writer-wins by timestamp.
//! - [`BookingLog`] is the append-only booking log.

pub mod bookings;
pub mod error;
pub mod registry;

pub use bookings::BookingLog;
pub use error::RegistryError;
pub use registry::{
    ApplyOutcome, ApplyStats, OccupancyUpdate, RegistryBuilder, RegistrySummary, RoomRegistry,
};
