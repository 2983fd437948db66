//! Startup wiring shared by the binary and the integration tests.
//!
//! Turns a [`ServerConfig`] into a populated [`AppState`]: load and validate
//! the room set, choose detectors and frame sources for the two sampling
//! contexts, and assemble the shared services.

use std::sync::Arc;

use roomwatch_core::error::ConfigError;
use roomwatch_core::room::{default_rooms, parse_room_configs, RoomConfig, SamplingMode};
use roomwatch_core::status::StatusPolicy;
use roomwatch_detector::{
    DetectionError, Detector, DirectoryFrameSource, FrameSource, HttpDetector,
    PlaceholderFrameSource, RandomWalkDetector, SimulatedDetector, TickSource,
};
use roomwatch_events::EventBus;
use roomwatch_pipeline::{RoomUpdater, SamplingManager, SamplingProfile};
use roomwatch_registry::{BookingLog, RoomRegistry};

use crate::config::{DetectorBackend, ServerConfig};
use crate::state::AppState;
use crate::ws::WsManager;

/// Read the room set from `ROOMS_FILE`, or the built-in layout.
pub fn load_room_configs(config: &ServerConfig) -> Result<Vec<RoomConfig>, ConfigError> {
    let Some(path) = &config.rooms_file else {
        return Ok(default_rooms());
    };
    let json = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::RoomsFile(format!("{}: {e}", path.display())))?;
    parse_room_configs(&json)
}

/// Build the registry, skipping rooms whose configuration is invalid.
///
/// Fails only when no room survives validation.
pub fn build_registry(
    configs: &[RoomConfig],
    policy: StatusPolicy,
) -> Result<RoomRegistry, ConfigError> {
    let mut builder = RoomRegistry::builder(policy);
    for config in configs {
        if let Err(e) = builder.add(config) {
            tracing::error!(room_id = %config.id, error = %e, "Skipping invalid room");
        }
    }
    if builder.is_empty() {
        return Err(ConfigError::NoValidRooms);
    }
    tracing::info!(
        rooms = builder.len(),
        skipped = configs.len() - builder.len(),
        "Room registry built"
    );
    Ok(builder.build())
}

/// Frame source and detector for `live` rooms.
pub fn live_profile(config: &ServerConfig) -> Result<SamplingProfile, DetectionError> {
    let detector: Arc<dyn Detector> = match &config.detector {
        DetectorBackend::Simulated => Arc::new(SimulatedDetector::default()),
        DetectorBackend::Http { url } => {
            Arc::new(HttpDetector::new(url.clone(), config.sampling.detect_timeout)?)
        }
    };
    let source: Arc<dyn FrameSource> = match &config.frame_dir {
        Some(dir) => Arc::new(DirectoryFrameSource::new(dir.clone())),
        None => Arc::new(PlaceholderFrameSource::new()),
    };
    tracing::info!(
        detector = detector.name(),
        frame_dir = ?config.frame_dir,
        "Live sampling profile ready"
    );
    Ok(SamplingProfile { source, detector })
}

/// Tick source and random-walk detector for `ambient` rooms.
pub fn ambient_profile(registry: &RoomRegistry) -> SamplingProfile {
    let walks = registry
        .list()
        .into_iter()
        .filter(|room| room.sampling_mode == SamplingMode::Ambient)
        .map(|room| (room.id, room.capacity, room.occupancy));

    SamplingProfile {
        source: Arc::new(TickSource::new()),
        detector: Arc::new(RandomWalkDetector::new(walks)),
    }
}

/// Assemble the shared application state.
///
/// `detector` serves request-driven detection; sampling loops use the
/// profiles.
pub fn build_state(
    config: ServerConfig,
    registry: RoomRegistry,
    live: SamplingProfile,
    ambient: SamplingProfile,
    detector: Arc<dyn Detector>,
) -> AppState {
    let sampling_config = config.sampling;
    let updater = RoomUpdater::new(Arc::new(registry), Arc::new(EventBus::default()));
    let sampling = SamplingManager::new(updater.clone(), live, ambient, sampling_config);

    AppState {
        config: Arc::new(config),
        updater,
        sampling: Arc::new(sampling),
        bookings: Arc::new(BookingLog::new()),
        detector,
        ws_manager: Arc::new(WsManager::new()),
    }
}
