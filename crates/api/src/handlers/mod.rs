pub mod bookings;
pub mod detect;
pub mod rooms;
pub mod sampling;
