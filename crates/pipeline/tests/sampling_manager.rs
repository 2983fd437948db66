//! Sampling loop lifecycle tests against a scripted detector.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use assert_matches::assert_matches;
use async_trait::async_trait;
use chrono::Utc;
use roomwatch_core::detection::DetectionSample;
use roomwatch_core::room::{RoomConfig, SamplingMode};
use roomwatch_core::status::StatusPolicy;
use roomwatch_detector::{DetectionError, Detector, SampleRef, TickSource};
use roomwatch_events::EventBus;
use roomwatch_pipeline::sampler::run_cycle;
use roomwatch_pipeline::{
    CycleOutcome, FrameCache, LoopContext, LoopState, RoomUpdater, SamplingConfig,
    SamplingError, SamplingManager, SamplingProfile,
};
use roomwatch_registry::RoomRegistry;
use tokio_util::sync::CancellationToken;

const INTERVAL: Duration = Duration::from_millis(20);

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Replays a script of counts and failures, then repeats `fallback`.
struct ScriptedDetector {
    script: Mutex<VecDeque<Result<u32, &'static str>>>,
    fallback: u32,
    calls: AtomicUsize,
}

impl ScriptedDetector {
    fn new(script: Vec<Result<u32, &'static str>>, fallback: u32) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            fallback,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Detector for ScriptedDetector {
    async fn detect(
        &self,
        room_id: &str,
        _sample: &SampleRef,
    ) -> Result<DetectionSample, DetectionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        match next.unwrap_or(Ok(self.fallback)) {
            Ok(count) => Ok(DetectionSample {
                room_id: room_id.to_string(),
                occupancy_count: count,
                boxes: Vec::new(),
                observed_at: Utc::now(),
            }),
            Err(msg) => Err(DetectionError::Capture(msg.to_string())),
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Panics on every call, taking its loop task down with it.
struct PanickingDetector;

#[async_trait]
impl Detector for PanickingDetector {
    async fn detect(
        &self,
        _room_id: &str,
        _sample: &SampleRef,
    ) -> Result<DetectionSample, DetectionError> {
        panic!("detector crashed")
    }

    fn name(&self) -> &'static str {
        "panicking"
    }
}

fn room(id: &str, capacity: u32) -> RoomConfig {
    RoomConfig {
        id: id.to_string(),
        name: format!("Room {id}"),
        capacity,
        occupancy: 0,
        equipment: Vec::new(),
        video_feed: None,
        sampling_mode: SamplingMode::Live,
    }
}

fn updater(rooms: &[RoomConfig]) -> RoomUpdater {
    let registry = RoomRegistry::new(rooms, StatusPolicy::default()).unwrap();
    RoomUpdater::new(Arc::new(registry), Arc::new(EventBus::default()))
}

fn config() -> SamplingConfig {
    SamplingConfig {
        live_interval: INTERVAL,
        ambient_interval: INTERVAL,
        detect_timeout: Duration::from_millis(200),
        stop_timeout: Duration::from_secs(2),
    }
}

fn manager(rooms: &[RoomConfig], detector: Arc<dyn Detector>) -> SamplingManager {
    let profile = SamplingProfile {
        source: Arc::new(TickSource::new()),
        detector,
    };
    SamplingManager::new(updater(rooms), profile.clone(), profile, config())
}

// ---------------------------------------------------------------------------
// Test: a failed cycle leaves the room unchanged and the next one runs
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failed_cycle_is_isolated() {
    let detector = ScriptedDetector::new(vec![Ok(3), Err("camera offline"), Ok(5)], 0);
    let updater = updater(&[room("r", 10)]);
    let ctx = LoopContext {
        room_id: "r".to_string(),
        interval: INTERVAL,
        detect_timeout: Duration::from_millis(200),
        source: Arc::new(TickSource::new()),
        detector: detector.clone(),
        updater: updater.clone(),
        frames: Arc::new(FrameCache::new()),
    };
    let cancel = CancellationToken::new();

    assert_eq!(
        run_cycle(&ctx, &cancel).await,
        CycleOutcome::Applied { occupancy: 3 }
    );
    let before = updater.registry().get("r").unwrap();

    assert_matches!(run_cycle(&ctx, &cancel).await, CycleOutcome::Failed(_));
    assert_eq!(updater.registry().get("r").unwrap(), before);

    assert_eq!(
        run_cycle(&ctx, &cancel).await,
        CycleOutcome::Applied { occupancy: 5 }
    );
    assert_eq!(detector.calls(), 3);
}

#[tokio::test]
async fn running_loop_survives_failures() {
    let detector = ScriptedDetector::new(vec![Err("boom"), Err("boom"), Ok(4)], 4);
    let manager = manager(&[room("r", 10)], detector.clone());

    manager.start("r").await.unwrap();
    tokio::time::sleep(INTERVAL * 8).await;

    assert_eq!(manager.state("r").unwrap(), LoopState::Running);
    assert!(detector.calls() >= 4);
    manager.stop("r").await.unwrap();
}

// ---------------------------------------------------------------------------
// Test: no registry writes after stop returns
// ---------------------------------------------------------------------------

#[tokio::test]
async fn stop_prevents_further_applies() {
    let detector = ScriptedDetector::new(Vec::new(), 2);
    let manager = manager(&[room("r", 10)], detector.clone());
    let registry = manager_registry(&manager);

    manager.start("r").await.unwrap();
    tokio::time::sleep(INTERVAL * 4).await;
    assert!(manager.stop("r").await.unwrap());
    assert_eq!(manager.state("r").unwrap(), LoopState::Idle);

    let stats_after_stop = registry.stats("r").unwrap();
    let calls_after_stop = detector.calls();
    assert!(stats_after_stop.total() >= 1);

    tokio::time::sleep(INTERVAL * 5).await;

    assert_eq!(registry.stats("r").unwrap(), stats_after_stop);
    assert_eq!(detector.calls(), calls_after_stop);
}

fn manager_registry(manager: &SamplingManager) -> Arc<RoomRegistry> {
    manager.updater().registry().clone()
}

// ---------------------------------------------------------------------------
// Test: start is idempotent, stop of an idle loop is a no-op
// ---------------------------------------------------------------------------

#[tokio::test]
async fn start_and_stop_are_idempotent() {
    let manager = manager(&[room("r", 10)], ScriptedDetector::new(Vec::new(), 1));

    assert!(manager.start("r").await.unwrap());
    assert!(!manager.start("r").await.unwrap());
    assert_eq!(manager.active_count(), 1);

    assert!(manager.stop("r").await.unwrap());
    assert!(!manager.stop("r").await.unwrap());
    assert_eq!(manager.active_count(), 0);
}

#[tokio::test]
async fn start_during_stop_waits_and_restarts() {
    let manager = manager(&[room("r", 10)], ScriptedDetector::new(Vec::new(), 1));
    manager.start("r").await.unwrap();

    let mut states = manager.watch_state("r").unwrap();
    let (stopped, started) = tokio::join!(manager.stop("r"), manager.start("r"));

    assert!(stopped.unwrap());
    assert!(started.unwrap());
    assert_eq!(*states.borrow_and_update(), LoopState::Running);
    manager.shutdown().await;
}

#[tokio::test]
async fn crashed_loop_is_not_reported_active() {
    let manager = manager(&[room("r", 10)], Arc::new(PanickingDetector));
    assert!(manager.start("r").await.unwrap());

    let mut states = manager.watch_state("r").unwrap();
    tokio::time::timeout(
        Duration::from_secs(2),
        states.wait_for(|state| *state == LoopState::Idle),
    )
    .await
    .unwrap()
    .unwrap();

    assert_eq!(manager.active_count(), 0);
    assert_eq!(manager.states()[0].state, LoopState::Idle);
    // The finished task does not block a restart.
    assert!(manager.start("r").await.unwrap());
    manager.shutdown().await;
}

#[tokio::test]
async fn unknown_room_is_rejected() {
    let manager = manager(&[room("r", 10)], ScriptedDetector::new(Vec::new(), 1));
    assert_eq!(
        manager.start("ghost").await,
        Err(SamplingError::UnknownRoom("ghost".to_string()))
    );
    assert_matches!(manager.stop("ghost").await, Err(SamplingError::UnknownRoom(_)));
    assert_matches!(manager.state("ghost"), Err(SamplingError::UnknownRoom(_)));
}

// ---------------------------------------------------------------------------
// Test: independent concurrent loops
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn many_rooms_sample_concurrently() {
    let rooms: Vec<_> = (0..8).map(|i| room(&format!("room-{i}"), 10)).collect();
    let manager = manager(&rooms, ScriptedDetector::new(Vec::new(), 6));
    let registry = manager_registry(&manager);

    assert_eq!(manager.start_all().await, 8);
    assert_eq!(manager.active_count(), 8);
    tokio::time::sleep(INTERVAL * 5).await;
    manager.shutdown().await;

    assert_eq!(manager.active_count(), 0);
    for config in &rooms {
        let room = registry.get(&config.id).unwrap();
        assert_eq!(room.occupancy, 6);
        assert!(room.last_update.is_some());
    }
}

// ---------------------------------------------------------------------------
// Test: shutdown refuses new loops
// ---------------------------------------------------------------------------

#[tokio::test]
async fn shutdown_stops_everything_and_refuses_new_starts() {
    let manager = manager(
        &[room("a", 5), room("b", 5)],
        ScriptedDetector::new(Vec::new(), 1),
    );
    manager.start_all().await;
    manager.shutdown().await;

    assert!(manager
        .states()
        .iter()
        .all(|status| status.state == LoopState::Idle));
    assert_eq!(manager.start("a").await, Err(SamplingError::ShuttingDown));
}
