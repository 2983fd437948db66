//! Remote detection capability over HTTP.
//!
//! Posts `{"roomId", "frameData"}` as JSON to `POST {base_url}/api/detect`,
//! with the frame encoded as a base64 data URL, and expects a JSON
//! [`DetectionResponse`] back.

use std::time::Duration;

use async_trait::async_trait;
use roomwatch_core::detection::{DetectionResponse, DetectionSample};
use serde::Serialize;

use crate::error::DetectionError;
use crate::sample::SampleRef;
use crate::Detector;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DetectRequest<'a> {
    room_id: &'a str,
    frame_data: String,
}

/// HTTP client for a remote detector.
pub struct HttpDetector {
    client: reqwest::Client,
    base_url: String,
}

impl HttpDetector {
    /// Create a detector for `base_url` (e.g. `http://host:8000`) whose
    /// requests give up after `timeout`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, DetectionError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Reuse an existing [`reqwest::Client`] for connection pooling.
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/api/detect", self.base_url)
    }

    // ---- private helpers ----

    /// Ensure the response has a success status, otherwise return a
    /// [`DetectionError::Capability`] carrying the status and body text.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, DetectionError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(DetectionError::Capability {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

/// Parse a detector response body and normalize it into a sample for
/// `room_id`. Boxes with non-finite geometry or out-of-range confidence are
/// rejected rather than silently dropped.
fn parse_detection(room_id: &str, body: &str) -> Result<DetectionSample, DetectionError> {
    let response: DetectionResponse =
        serde_json::from_str(body).map_err(|e| DetectionError::Decode(e.to_string()))?;
    if response.room_id != room_id {
        return Err(DetectionError::Decode(format!(
            "response is for room {}, expected {room_id}",
            response.room_id
        )));
    }
    if let Some(bad) = response.bounding_boxes.iter().find(|b| !b.is_valid()) {
        return Err(DetectionError::Decode(format!("invalid bounding box {bad:?}")));
    }
    Ok(response.into_sample())
}

#[async_trait]
impl Detector for HttpDetector {
    async fn detect(
        &self,
        room_id: &str,
        sample: &SampleRef,
    ) -> Result<DetectionSample, DetectionError> {
        let frame = sample.frame().ok_or_else(|| {
            DetectionError::Decode("remote detector requires an image frame".to_string())
        })?;

        let request = DetectRequest {
            room_id,
            frame_data: frame.to_data_url(),
        };

        let response = self
            .client
            .post(self.endpoint())
            .json(&request)
            .send()
            .await?;
        let body = Self::ensure_success(response).await?.text().await?;

        let detection = parse_detection(room_id, &body)?;
        tracing::debug!(
            room_id = %room_id,
            people = detection.occupancy_count,
            "Remote detection complete"
        );
        Ok(detection)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
