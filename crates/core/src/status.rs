//! Occupancy status policy.
//!
//! Pure logic: maps an occupancy count and a room capacity to a
//! [`RoomStatus`]. A single ratio rule is used everywhere a status is
//! derived, so a room reported "full" by the sampling pipeline, by a manual
//! override, or by the detection endpoint always means the same thing.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default percentage of capacity at which a room counts as full.
pub const DEFAULT_FULL_THRESHOLD_PERCENT: u32 = 80;

/// Derived operational label of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Available,
    Occupied,
    Full,
}

impl RoomStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Occupied => "occupied",
            Self::Full => "full",
        }
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The status rule: `0 -> available`, `>= ceil(capacity * p / 100) -> full`,
/// otherwise `occupied`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusPolicy {
    full_threshold_percent: u32,
}

impl StatusPolicy {
    /// Build a policy with a custom full threshold (1..=100 percent).
    pub fn new(full_threshold_percent: u32) -> Result<Self, ConfigError> {
        if !(1..=100).contains(&full_threshold_percent) {
            return Err(ConfigError::InvalidEnv {
                var: "FULL_THRESHOLD_PERCENT",
                reason: format!("{full_threshold_percent} is outside 1..=100"),
            });
        }
        Ok(Self {
            full_threshold_percent,
        })
    }

    pub fn full_threshold_percent(&self) -> u32 {
        self.full_threshold_percent
    }

    /// Smallest occupancy that counts as full for `capacity`.
    ///
    /// Integer form of `ceil(capacity * p / 100)`.
    pub fn full_threshold(&self, capacity: u32) -> u32 {
        let scaled = u64::from(capacity) * u64::from(self.full_threshold_percent);
        ((scaled + 99) / 100) as u32
    }

    /// Derive the status for an occupancy count. Total and side-effect free.
    ///
    /// Capacity `0` is rejected when rooms are constructed, so it is never
    /// passed here by the pipeline.
    pub fn derive_status(&self, occupancy: u32, capacity: u32) -> RoomStatus {
        if occupancy == 0 {
            RoomStatus::Available
        } else if occupancy >= self.full_threshold(capacity) {
            RoomStatus::Full
        } else {
            RoomStatus::Occupied
        }
    }
}

impl Default for StatusPolicy {
    fn default() -> Self {
        Self {
            full_threshold_percent: DEFAULT_FULL_THRESHOLD_PERCENT,
        }
    }
}

/// Derive a status with the default policy.
pub fn derive_status(occupancy: u32, capacity: u32) -> RoomStatus {
    StatusPolicy::default().derive_status(occupancy, capacity)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_occupancy_is_available_for_any_capacity() {
        for capacity in 1..=50 {
            assert_eq!(derive_status(0, capacity), RoomStatus::Available);
        }
    }

    #[test]
    fn full_iff_at_or_above_ceil_of_eighty_percent() {
        for capacity in 1..=200u32 {
            let threshold = (f64::from(capacity) * 0.8).ceil() as u32;
            for occupancy in 1..=capacity * 2 {
                let expected = if occupancy >= threshold {
                    RoomStatus::Full
                } else {
                    RoomStatus::Occupied
                };
                assert_eq!(
                    derive_status(occupancy, capacity),
                    expected,
                    "occupancy {occupancy}, capacity {capacity}"
                );
            }
        }
    }

    #[test]
    fn capacity_eight_sequence() {
        let statuses: Vec<_> = [0, 3, 6, 8]
            .iter()
            .map(|&o| derive_status(o, 8))
            .collect();
        assert_eq!(
            statuses,
            vec![
                RoomStatus::Available,
                RoomStatus::Occupied,
                RoomStatus::Occupied,
                RoomStatus::Full
            ]
        );
        assert_eq!(StatusPolicy::default().full_threshold(8), 7);
    }

    #[test]
    fn occupancy_above_capacity_is_full() {
        assert_eq!(derive_status(30, 12), RoomStatus::Full);
    }

    #[test]
    fn capacity_one_is_full_with_one_person() {
        assert_eq!(derive_status(1, 1), RoomStatus::Full);
    }

    #[test]
    fn custom_threshold_percent() {
        let policy = StatusPolicy::new(50).unwrap();
        assert_eq!(policy.full_threshold(10), 5);
        assert_eq!(policy.derive_status(4, 10), RoomStatus::Occupied);
        assert_eq!(policy.derive_status(5, 10), RoomStatus::Full);
    }

    #[test]
    fn threshold_percent_out_of_range_is_rejected() {
        assert!(StatusPolicy::new(0).is_err());
        assert!(StatusPolicy::new(101).is_err());
        assert!(StatusPolicy::new(100).is_ok());
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&RoomStatus::Occupied).unwrap();
        assert_eq!(json, "\"occupied\"");
        assert_eq!(RoomStatus::Full.to_string(), "full");
    }
}
