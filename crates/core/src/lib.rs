//! Roomwatch domain types.
//!
//! Pure data and policy shared by every other crate: rooms and their
//! configuration, the occupancy status policy, detection samples, room
//! update events, bookings, and the error taxonomy. Nothing in this crate
//! performs I/O.

pub mod booking;
pub mod detection;
pub mod error;
pub mod event;
pub mod room;
pub mod status;
pub mod types;
