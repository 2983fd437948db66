//! Shared helpers for API integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{Method, Request, Response};
use axum::Router;
use chrono::Utc;
use http_body_util::BodyExt;
use roomwatch_api::bootstrap::{build_registry, build_state};
use roomwatch_api::config::{DetectorBackend, ServerConfig};
use roomwatch_api::router::build_app_router;
use roomwatch_api::state::AppState;
use roomwatch_core::detection::DetectionSample;
use roomwatch_core::room::{RoomConfig, SamplingMode};
use roomwatch_core::status::StatusPolicy;
use roomwatch_detector::{
    DetectionError, Detector, Frame, PlaceholderFrameSource, SampleRef, SimulatedDetector,
    TickSource,
};
use roomwatch_pipeline::{SamplingConfig, SamplingProfile};
use tower::ServiceExt;

pub const INTERVAL: Duration = Duration::from_millis(20);

// ---------------------------------------------------------------------------
// Detectors
// ---------------------------------------------------------------------------

/// Reports a settable head count and counts its calls.
pub struct FixedDetector {
    count: AtomicU32,
    calls: AtomicUsize,
}

impl FixedDetector {
    pub fn new(count: u32) -> Arc<Self> {
        Arc::new(Self {
            count: AtomicU32::new(count),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn set(&self, count: u32) {
        self.count.store(count, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Detector for FixedDetector {
    async fn detect(
        &self,
        room_id: &str,
        _sample: &SampleRef,
    ) -> Result<DetectionSample, DetectionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(DetectionSample {
            room_id: room_id.to_string(),
            occupancy_count: self.count.load(Ordering::SeqCst),
            boxes: Vec::new(),
            observed_at: Utc::now(),
        })
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

/// Simulated detection that remembers every frame it was given.
pub struct RecordingDetector {
    inner: SimulatedDetector,
    frames: Mutex<Vec<Frame>>,
}

impl RecordingDetector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: SimulatedDetector::new(Duration::ZERO, 10),
            frames: Mutex::new(Vec::new()),
        })
    }

    pub fn frames(&self) -> Vec<Frame> {
        self.frames.lock().unwrap().clone()
    }
}

#[async_trait]
impl Detector for RecordingDetector {
    async fn detect(
        &self,
        room_id: &str,
        sample: &SampleRef,
    ) -> Result<DetectionSample, DetectionError> {
        if let Some(frame) = sample.frame() {
            self.frames.lock().unwrap().push(frame.clone());
        }
        self.inner.detect(room_id, sample).await
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

// ---------------------------------------------------------------------------
// App construction
// ---------------------------------------------------------------------------

/// Test configuration: fast cadences, no autostart, no external services.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        stale_after_secs: 15,
        status_policy: StatusPolicy::default(),
        detector: DetectorBackend::Simulated,
        frame_dir: None,
        persist_url: None,
        rooms_file: None,
        autostart_sampling: false,
        sampling: SamplingConfig {
            live_interval: INTERVAL,
            ambient_interval: INTERVAL,
            detect_timeout: Duration::from_millis(500),
            stop_timeout: Duration::from_secs(2),
        },
    }
}

fn room(id: &str, name: &str, capacity: u32, mode: SamplingMode) -> RoomConfig {
    RoomConfig {
        id: id.to_string(),
        name: name.to_string(),
        capacity,
        occupancy: 0,
        equipment: vec!["Whiteboard".to_string()],
        video_feed: None,
        sampling_mode: mode,
    }
}

/// Two live rooms (capacity 8 and 12) and one ambient room (capacity 6).
pub fn test_rooms() -> Vec<RoomConfig> {
    vec![
        room("room-1", "Meeting Room B", 8, SamplingMode::Live),
        room("room-2", "Conference Room A", 12, SamplingMode::Live),
        room("room-3", "Collaboration Space", 6, SamplingMode::Ambient),
    ]
}

/// Handles a test keeps onto the injected detectors.
pub struct TestHarness {
    pub state: AppState,
    pub live: Arc<FixedDetector>,
    pub ambient: Arc<FixedDetector>,
    /// Serves `POST /api/detect`.
    pub compat: Arc<RecordingDetector>,
}

impl TestHarness {
    pub fn new() -> Self {
        let config = test_config();
        let registry = build_registry(&test_rooms(), config.status_policy).unwrap();
        let live = FixedDetector::new(5);
        let ambient = FixedDetector::new(2);
        let compat = RecordingDetector::new();

        let state = build_state(
            config,
            registry,
            SamplingProfile {
                source: Arc::new(PlaceholderFrameSource::new()),
                detector: live.clone(),
            },
            SamplingProfile {
                source: Arc::new(TickSource::new()),
                detector: ambient.clone(),
            },
            compat.clone(),
        );

        Self {
            state,
            live,
            ambient,
            compat,
        }
    }

    pub fn app(&self) -> Router {
        build_app_router(self.state.clone(), &self.state.config)
    }
}

/// Build the full application router with a fresh state.
pub fn build_test_app() -> Router {
    TestHarness::new().app()
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_empty(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn send_json(
    app: Router,
    method: Method,
    uri: &str,
    body: serde_json::Value,
) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Send a multipart form built from `(name, bytes)` parts.
pub async fn post_multipart(app: Router, uri: &str, parts: &[(&str, &[u8])]) -> Response<Body> {
    const BOUNDARY: &str = "roomwatch-test-boundary";
    let mut body = Vec::new();
    for (name, bytes) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        if *name == "frame" {
            body.extend_from_slice(
                b"Content-Disposition: form-data; name=\"frame\"; filename=\"frame.png\"\r\n\
                  Content-Type: application/octet-stream\r\n\r\n",
            );
        } else {
            body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
            );
        }
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
