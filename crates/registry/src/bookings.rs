//! Append-only booking log.

use std::sync::{PoisonError, RwLock};

use roomwatch_core::booking::Booking;

/// In-memory booking log. Entries are never edited or removed.
#[derive(Default)]
pub struct BookingLog {
    entries: RwLock<Vec<Booking>>,
}

impl BookingLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a booking and return it.
    pub fn append(&self, booking: Booking) -> Booking {
        tracing::info!(
            booking_id = %booking.id,
            room_id = %booking.room_id,
            date = %booking.date,
            "Booking recorded"
        );
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(booking.clone());
        booking
    }

    /// All bookings in insertion order.
    pub fn list(&self) -> Vec<Booking> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The `limit` most recent bookings, newest first.
    pub fn recent(&self, limit: usize) -> Vec<Booking> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use roomwatch_core::booking::NewBooking;

    use super::*;

    fn booking(user: &str) -> Booking {
        NewBooking {
            room_id: "room-1".to_string(),
            user_name: user.to_string(),
            date: "2026-04-01".to_string(),
            start_time: "13:00".to_string(),
            end_time: "14:00".to_string(),
            purpose: None,
        }
        .into_booking()
    }

    #[test]
    fn append_preserves_order() {
        let log = BookingLog::new();
        log.append(booking("a"));
        log.append(booking("b"));
        let users: Vec<_> = log.list().into_iter().map(|b| b.user_name).collect();
        assert_eq!(users, vec!["a", "b"]);
    }

    #[test]
    fn recent_is_newest_first_and_limited() {
        let log = BookingLog::new();
        for user in ["a", "b", "c"] {
            log.append(booking(user));
        }
        let users: Vec<_> = log.recent(2).into_iter().map(|b| b.user_name).collect();
        assert_eq!(users, vec!["c", "b"]);
        assert_eq!(log.len(), 3);
    }
}
