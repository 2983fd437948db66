//! Room update fan-out.
//!
//! - [`EventBus`] -- in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`. Publishing never blocks the sampling loops.
//! - [`RoomFeed`] -- a subscription that recovers from falling behind by
//!   resynchronising from the registry snapshot.
//! - [`OccupancyPersistence`] -- background sink forwarding accepted updates
//!   to a remote "persist occupancy" endpoint, last-writer-wins per room.

pub mod bus;
pub mod feed;
pub mod persistence;

pub use bus::EventBus;
pub use feed::RoomFeed;
pub use persistence::{OccupancyPersistence, PersistError};
