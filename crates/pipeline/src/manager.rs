//! Per-room sampling loop control.
//!
//! [`SamplingManager`] owns one slot per registered room. Each slot moves
//! through `Idle -> Running -> Stopping -> Idle`:
//!
//! - `start` spawns the loop with a child of the master cancellation token.
//!   Starting a running loop is a no-op.
//! - `stop` cancels the loop's token and joins the task before returning,
//!   so no registry write for that room can happen afterwards. A `start`
//!   that arrives while a stop is in progress waits for it to finish.
//! - `shutdown` cancels the master token and stops every loop.
//!
//! A loop that exits on its own (a panic) flips its slot back to `Idle`.
//! The task only touches the slot's state channel, never its control lock,
//! so stopping cannot deadlock on it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use roomwatch_core::room::SamplingMode;
use roomwatch_core::types::RoomId;
use roomwatch_detector::{Detector, FrameSource};
use serde::Serialize;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::SamplingConfig;
use crate::error::SamplingError;
use crate::frames::FrameCache;
use crate::sampler::{run_sampling_loop, LoopContext};
use crate::updater::RoomUpdater;

/// Lifecycle state of one room's loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopState {
    Idle,
    Running,
    Stopping,
}

/// Snapshot of one room's loop, for the control API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoopStatus {
    pub room_id: RoomId,
    pub mode: SamplingMode,
    pub state: LoopState,
}

/// Sample source and detector used for one sampling mode.
#[derive(Clone)]
pub struct SamplingProfile {
    pub source: Arc<dyn FrameSource>,
    pub detector: Arc<dyn Detector>,
}

struct RunningLoop {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

struct RoomSlot {
    mode: SamplingMode,
    /// Held for the whole of a start or stop.
    control: Mutex<Option<RunningLoop>>,
    state: Arc<watch::Sender<LoopState>>,
}

/// Moves a `Running` slot to `Idle` when the loop task ends without a stop.
struct IdleOnExit(Arc<watch::Sender<LoopState>>);

impl Drop for IdleOnExit {
    fn drop(&mut self) {
        self.0.send_if_modified(|state| {
            if *state == LoopState::Running {
                *state = LoopState::Idle;
                true
            } else {
                false
            }
        });
    }
}

pub struct SamplingManager {
    updater: RoomUpdater,
    live: SamplingProfile,
    ambient: SamplingProfile,
    config: SamplingConfig,
    frames: Arc<FrameCache>,
    slots: HashMap<RoomId, RoomSlot>,
    order: Vec<RoomId>,
    /// Master cancellation token; cancelled during shutdown.
    cancel: CancellationToken,
}

impl SamplingManager {
    /// Create a manager with an idle slot for every room in the registry.
    pub fn new(
        updater: RoomUpdater,
        live: SamplingProfile,
        ambient: SamplingProfile,
        config: SamplingConfig,
    ) -> Self {
        let rooms = updater.registry().list();
        let order = rooms.iter().map(|room| room.id.clone()).collect();
        let slots = rooms
            .into_iter()
            .map(|room| {
                let (state, _) = watch::channel(LoopState::Idle);
                (
                    room.id,
                    RoomSlot {
                        mode: room.sampling_mode,
                        control: Mutex::new(None),
                        state: Arc::new(state),
                    },
                )
            })
            .collect();

        Self {
            updater,
            live,
            ambient,
            config,
            frames: Arc::new(FrameCache::new()),
            slots,
            order,
            cancel: CancellationToken::new(),
        }
    }

    pub fn updater(&self) -> &RoomUpdater {
        &self.updater
    }

    pub fn frames(&self) -> &Arc<FrameCache> {
        &self.frames
    }

    pub fn config(&self) -> &SamplingConfig {
        &self.config
    }

    /// Start a room's loop. Returns `false` if it was already running.
    pub async fn start(&self, room_id: &str) -> Result<bool, SamplingError> {
        let slot = self.slot(room_id)?;
        let mut control = slot.control.lock().await;

        if self.cancel.is_cancelled() {
            return Err(SamplingError::ShuttingDown);
        }
        if let Some(running) = control.as_ref() {
            if !running.handle.is_finished() {
                return Ok(false);
            }
            tracing::warn!(room_id, "Sampling loop had exited on its own, restarting");
        }

        let (profile, interval) = self.profile(slot.mode);
        let ctx = LoopContext {
            room_id: room_id.to_string(),
            interval,
            detect_timeout: self.config.detect_timeout,
            source: Arc::clone(&profile.source),
            detector: Arc::clone(&profile.detector),
            updater: self.updater.clone(),
            frames: Arc::clone(&self.frames),
        };
        let cancel = self.cancel.child_token();
        slot.state.send_replace(LoopState::Running);
        let exit_guard = IdleOnExit(Arc::clone(&slot.state));
        let loop_cancel = cancel.clone();
        let handle = tokio::spawn(async move {
            let _exit_guard = exit_guard;
            run_sampling_loop(ctx, loop_cancel).await;
        });

        *control = Some(RunningLoop { cancel, handle });
        Ok(true)
    }

    /// Stop a room's loop and wait for it to exit. Returns `false` if it
    /// was not running.
    pub async fn stop(&self, room_id: &str) -> Result<bool, SamplingError> {
        let slot = self.slot(room_id)?;
        let mut control = slot.control.lock().await;

        let Some(running) = control.take() else {
            return Ok(false);
        };

        slot.state.send_replace(LoopState::Stopping);
        let joined = join_loop(room_id, running, self.config.stop_timeout).await;
        slot.state.send_replace(LoopState::Idle);

        joined.map(|()| true)
    }

    /// Start every room's loop. Returns how many were newly started.
    pub async fn start_all(&self) -> usize {
        let mut started = 0;
        for room_id in &self.order {
            match self.start(room_id).await {
                Ok(true) => started += 1,
                Ok(false) => {}
                Err(e) => tracing::error!(room_id = %room_id, error = %e, "Failed to start sampling"),
            }
        }
        started
    }

    pub fn state(&self, room_id: &str) -> Result<LoopState, SamplingError> {
        Ok(*self.slot(room_id)?.state.borrow())
    }

    /// Watch a room's loop state.
    pub fn watch_state(&self, room_id: &str) -> Result<watch::Receiver<LoopState>, SamplingError> {
        Ok(self.slot(room_id)?.state.subscribe())
    }

    /// Every room's loop state, in registry order.
    pub fn states(&self) -> Vec<LoopStatus> {
        self.order
            .iter()
            .filter_map(|id| {
                self.slots.get(id).map(|slot| LoopStatus {
                    room_id: id.clone(),
                    mode: slot.mode,
                    state: *slot.state.borrow(),
                })
            })
            .collect()
    }

    pub fn active_count(&self) -> usize {
        self.slots
            .values()
            .filter(|slot| *slot.state.borrow() == LoopState::Running)
            .count()
    }

    /// Gracefully stop every loop. New starts are refused afterwards.
    pub async fn shutdown(&self) {
        tracing::info!("Shutting down sampling manager");
        self.cancel.cancel();

        for room_id in &self.order {
            if let Err(e) = self.stop(room_id).await {
                tracing::error!(room_id = %room_id, error = %e, "Sampling loop did not stop cleanly");
            }
        }

        tracing::info!("Sampling manager shut down complete");
    }

    // ---- private helpers ----

    fn slot(&self, room_id: &str) -> Result<&RoomSlot, SamplingError> {
        self.slots
            .get(room_id)
            .ok_or_else(|| SamplingError::UnknownRoom(room_id.to_string()))
    }

    fn profile(&self, mode: SamplingMode) -> (&SamplingProfile, Duration) {
        match mode {
            SamplingMode::Live => (&self.live, self.config.live_interval),
            SamplingMode::Ambient => (&self.ambient, self.config.ambient_interval),
        }
    }
}

/// Cancel a loop and wait for its task, aborting it after `timeout`.
async fn join_loop(
    room_id: &str,
    running: RunningLoop,
    timeout: Duration,
) -> Result<(), SamplingError> {
    let RunningLoop { cancel, mut handle } = running;
    cancel.cancel();

    match tokio::time::timeout(timeout, &mut handle).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(SamplingError::TaskFailed {
            room_id: room_id.to_string(),
            reason: e.to_string(),
        }),
        Err(_) => {
            tracing::warn!(
                room_id,
                timeout_ms = timeout.as_millis() as u64,
                "Sampling loop did not exit in time, aborting"
            );
            handle.abort();
            // The task can no longer run; a cancelled JoinError is expected.
            let _ = handle.await;
            Ok(())
        }
    }
}
