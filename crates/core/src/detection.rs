//! Detection samples and the detection wire format.
//!
//! [`DetectionSample`] is the normalized, ephemeral result of one detector
//! call. [`DetectionResponse`] is the JSON shape exchanged with the external
//! detection capability and returned by the compatibility endpoint.

use chrono::DateTime;
use serde::{de, Deserialize, Deserializer, Serialize};

use crate::status::RoomStatus;
use crate::types::{RoomId, Timestamp};

/// One detected person.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Detection confidence in `[0, 1]`.
    pub confidence: f64,
}

impl BoundingBox {
    /// Finite geometry, non-negative extent and a confidence in `[0, 1]`.
    pub fn is_valid(&self) -> bool {
        [self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite())
            && self.width >= 0.0
            && self.height >= 0.0
            && (0.0..=1.0).contains(&self.confidence)
    }
}

/// Normalized output of one detector invocation.
///
/// Produced by a detector, consumed once by the sampling loop, never
/// retained by the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionSample {
    pub room_id: RoomId,
    pub occupancy_count: u32,
    pub boxes: Vec<BoundingBox>,
    pub observed_at: Timestamp,
}

/// Wire shape of a detection result.
///
/// Serialises as `{roomId, peopleCount, boundingBoxes, status, timestamp}`;
/// `occupancyCount` and `boxes` are accepted as aliases when parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResponse {
    pub room_id: RoomId,
    #[serde(alias = "occupancyCount")]
    pub people_count: u32,
    #[serde(alias = "boxes", default)]
    pub bounding_boxes: Vec<BoundingBox>,
    pub status: RoomStatus,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: Timestamp,
}

/// Accept an RFC 3339 string or seconds since the Unix epoch (Python's
/// `time.time()`).
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Timestamp, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum WireTimestamp {
        Rfc3339(Timestamp),
        EpochSeconds(f64),
    }

    match WireTimestamp::deserialize(deserializer)? {
        WireTimestamp::Rfc3339(ts) => Ok(ts),
        WireTimestamp::EpochSeconds(secs) => {
            let millis = (secs * 1000.0).round();
            if !millis.is_finite() {
                return Err(de::Error::custom(format!("invalid epoch timestamp {secs}")));
            }
            DateTime::from_timestamp_millis(millis as i64).ok_or_else(|| {
                de::Error::custom(format!("epoch timestamp {secs} out of range"))
            })
        }
    }
}

impl DetectionResponse {
    pub fn from_sample(sample: &DetectionSample, status: RoomStatus) -> Self {
        Self {
            room_id: sample.room_id.clone(),
            people_count: sample.occupancy_count,
            bounding_boxes: sample.boxes.clone(),
            status,
            timestamp: sample.observed_at,
        }
    }

    /// Drop the remote status; the pipeline re-derives it from capacity.
    pub fn into_sample(self) -> DetectionSample {
        DetectionSample {
            room_id: self.room_id,
            occupancy_count: self.people_count,
            boxes: self.bounding_boxes,
            observed_at: self.timestamp,
        }
    }
}
