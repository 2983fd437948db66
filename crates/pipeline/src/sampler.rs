//! One room's sampling loop.
//!
//! Every tick: acquire a sample, run detection under a timeout, clamp the
//! count to the occupancy ceiling, and hand it to the [`RoomUpdater`]
//! stamped with the local receive time. A
//! failed or timed-out cycle leaves the room unchanged and the loop carries
//! on at the next tick. Cancellation is observed between cycles and also
//! interrupts an in-flight acquire/detect step.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use roomwatch_core::event::UpdateSource;
use roomwatch_core::room::OCCUPANCY_SOFT_CEILING;
use roomwatch_core::types::RoomId;
use roomwatch_detector::{DetectionError, Detector, FrameSource};
use roomwatch_registry::ApplyOutcome;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::frames::FrameCache;
use crate::updater::RoomUpdater;

/// Everything a loop needs. Holds no room state of its own.
#[derive(Clone)]
pub struct LoopContext {
    pub room_id: RoomId,
    pub interval: Duration,
    pub detect_timeout: Duration,
    pub source: Arc<dyn FrameSource>,
    pub detector: Arc<dyn Detector>,
    pub updater: RoomUpdater,
    pub frames: Arc<FrameCache>,
}

/// What a single cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The registry accepted the update.
    Applied { occupancy: u32 },
    /// The registry already held this or newer state.
    Unchanged,
    /// Acquisition, detection or apply failed; the room was not touched.
    Failed(String),
    /// Cancellation arrived before the result was applied.
    Cancelled,
}

/// Run the loop until `cancel` fires. The first cycle starts immediately.
pub async fn run_sampling_loop(ctx: LoopContext, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(ctx.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::info!(
        room_id = %ctx.room_id,
        detector = ctx.detector.name(),
        interval_ms = ctx.interval.as_millis() as u64,
        "Sampling loop started"
    );

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                if run_cycle(&ctx, &cancel).await == CycleOutcome::Cancelled {
                    break;
                }
            }
        }
    }

    tracing::info!(room_id = %ctx.room_id, "Sampling loop stopped");
}

/// Run one acquire/detect/apply cycle.
pub async fn run_cycle(ctx: &LoopContext, cancel: &CancellationToken) -> CycleOutcome {
    let step = async {
        let sample = ctx.source.acquire(&ctx.room_id).await?;
        if let Some(frame) = sample.frame() {
            ctx.frames.store(&ctx.room_id, frame.clone());
        }
        ctx.detector.detect(&ctx.room_id, &sample).await
    };

    let detected = tokio::select! {
        biased;
        _ = cancel.cancelled() => return CycleOutcome::Cancelled,
        result = tokio::time::timeout(ctx.detect_timeout, step) => {
            result.unwrap_or(Err(DetectionError::Timeout(ctx.detect_timeout)))
        }
    };

    let detection = match detected {
        Ok(detection) => detection,
        Err(e) => {
            tracing::warn!(
                room_id = %ctx.room_id,
                detector = ctx.detector.name(),
                error = %e,
                "Detection failed, skipping cycle"
            );
            return CycleOutcome::Failed(e.to_string());
        }
    };

    if cancel.is_cancelled() {
        return CycleOutcome::Cancelled;
    }

    // Ordering uses this process's clock; a remote detector's clock may drift.
    let received_at = Utc::now();
    tracing::trace!(
        room_id = %ctx.room_id,
        reported_at = %detection.observed_at,
        %received_at,
        "Detection received"
    );

    let mut occupancy = detection.occupancy_count;
    if occupancy > OCCUPANCY_SOFT_CEILING {
        tracing::warn!(
            room_id = %ctx.room_id,
            reported = occupancy,
            ceiling = OCCUPANCY_SOFT_CEILING,
            "Detected count above ceiling, clamping"
        );
        occupancy = OCCUPANCY_SOFT_CEILING;
    }

    match ctx.updater.record(
        &ctx.room_id,
        occupancy,
        received_at,
        UpdateSource::Sampled,
    ) {
        Ok(ApplyOutcome::Applied(room)) => {
            tracing::debug!(
                room_id = %ctx.room_id,
                occupancy = room.occupancy,
                status = %room.status,
                "Room updated"
            );
            CycleOutcome::Applied {
                occupancy: room.occupancy,
            }
        }
        Ok(ApplyOutcome::Duplicate(_)) | Ok(ApplyOutcome::Stale { .. }) => CycleOutcome::Unchanged,
        Err(e) => {
            tracing::warn!(room_id = %ctx.room_id, error = %e, "Room update rejected");
            CycleOutcome::Failed(e.to_string())
        }
    }
}
