//! Room bookings.
//!
//! Bookings are opaque, append-only log entries. There is no overlap
//! detection; the only checks are that the required fields are present and
//! that dates and times are well formed.

use chrono::{NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::error::CoreError;
use crate::types::{RoomId, Timestamp};

/// A recorded booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: String,
    pub room_id: RoomId,
    pub user_name: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub purpose: Option<String>,
    pub created_at: Timestamp,
}

/// Request body for creating a booking.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewBooking {
    #[validate(length(min = 1, message = "roomId is required"))]
    pub room_id: RoomId,
    #[validate(length(min = 1, max = 128, message = "userName is required"))]
    pub user_name: String,
    #[validate(custom(function = "validate_date"))]
    pub date: String,
    #[validate(custom(function = "validate_time"))]
    pub start_time: String,
    #[validate(custom(function = "validate_time"))]
    pub end_time: String,
    #[serde(default)]
    #[validate(length(max = 500))]
    pub purpose: Option<String>,
}

impl NewBooking {
    /// Run field validation and map failures to [`CoreError::Validation`].
    pub fn check(&self) -> Result<(), CoreError> {
        self.validate()
            .map_err(|e| CoreError::Validation(e.to_string()))
    }

    /// Turn a validated request into a log entry with a fresh id.
    pub fn into_booking(self) -> Booking {
        Booking {
            id: format!("booking-{}", uuid::Uuid::new_v4()),
            room_id: self.room_id,
            user_name: self.user_name,
            date: self.date,
            start_time: self.start_time,
            end_time: self.end_time,
            purpose: self.purpose.filter(|p| !p.trim().is_empty()),
            created_at: Utc::now(),
        }
    }
}

/// `YYYY-MM-DD`.
fn validate_date(value: &str) -> Result<(), ValidationError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| ValidationError::new("date").with_message("expected YYYY-MM-DD".into()))
}

/// `HH:MM`, 24-hour clock.
fn validate_time(value: &str) -> Result<(), ValidationError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map(|_| ())
        .map_err(|_| ValidationError::new("time").with_message("expected HH:MM".into()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
