use std::sync::Arc;

use roomwatch_detector::Detector;
use roomwatch_events::EventBus;
use roomwatch_pipeline::{RoomUpdater, SamplingManager};
use roomwatch_registry::{BookingLog, RoomRegistry};

use crate::config::ServerConfig;
use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// The only write path for room occupancy; also owns the registry and bus.
    pub updater: RoomUpdater,
    /// Per-room sampling loop control.
    pub sampling: Arc<SamplingManager>,
    /// Append-only booking log.
    pub bookings: Arc<BookingLog>,
    /// Detector used by the request-driven `/api/detect` endpoint.
    pub detector: Arc<dyn Detector>,
    /// WebSocket connection manager (browser clients).
    pub ws_manager: Arc<WsManager>,
}

impl AppState {
    pub fn registry(&self) -> &Arc<RoomRegistry> {
        self.updater.registry()
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        self.updater.bus()
    }
}
