//! Handlers for sampling loop control.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use roomwatch_core::types::RoomId;
use roomwatch_pipeline::LoopState;
use serde::Serialize;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// Result of a start or stop request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoopTransition {
    pub room_id: RoomId,
    /// `false` when the loop was already in the requested state.
    pub changed: bool,
    pub state: LoopState,
}

/// POST /api/v1/rooms/{id}/sampling/start
pub async fn start_sampling(
    State(state): State<AppState>,
    Path(room_id): Path<RoomId>,
) -> AppResult<impl IntoResponse> {
    let changed = state.sampling.start(&room_id).await?;
    let current = state.sampling.state(&room_id)?;

    tracing::info!(room_id = %room_id, changed, "Sampling start requested");

    Ok(Json(DataResponse {
        data: LoopTransition {
            room_id,
            changed,
            state: current,
        },
    }))
}

/// POST /api/v1/rooms/{id}/sampling/stop
///
/// Returns once the loop has exited; no further updates for the room
/// follow the response.
pub async fn stop_sampling(
    State(state): State<AppState>,
    Path(room_id): Path<RoomId>,
) -> AppResult<impl IntoResponse> {
    let changed = state.sampling.stop(&room_id).await?;
    let current = state.sampling.state(&room_id)?;

    tracing::info!(room_id = %room_id, changed, "Sampling stop requested");

    Ok(Json(DataResponse {
        data: LoopTransition {
            room_id,
            changed,
            state: current,
        },
    }))
}

/// GET /api/v1/sampling
pub async fn list_states(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    Ok(Json(DataResponse {
        data: state.sampling.states(),
    }))
}
