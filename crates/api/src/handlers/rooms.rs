//! Handlers for the room query/update service.
//!
//! Reads come straight from the registry snapshot; the only write is the
//! manual occupancy override, which goes through the same
//! [`RoomUpdater`](roomwatch_pipeline::RoomUpdater) path as sampled updates.

use axum::extract::{Path, State};
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use roomwatch_core::error::CoreError;
use roomwatch_core::room::Room;
use roomwatch_core::status::RoomStatus;
use roomwatch_core::types::{RoomId, Timestamp};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Body of `PUT /api/v1/rooms/{id}/occupancy`.
#[derive(Debug, Deserialize)]
pub struct OccupancyOverride {
    pub occupancy: u32,
}

// ---------------------------------------------------------------------------
// Versioned API
// ---------------------------------------------------------------------------

/// GET /api/v1/rooms
pub async fn list_rooms(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    Ok(Json(DataResponse {
        data: state.registry().list(),
    }))
}

/// GET /api/v1/rooms/summary
///
/// Status counts plus the number of rooms without a recent update.
pub async fn summary(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let summary = state
        .registry()
        .summary(Utc::now(), state.config.stale_after());

    Ok(Json(DataResponse { data: summary }))
}

/// GET /api/v1/rooms/{id}
pub async fn get_room(
    State(state): State<AppState>,
    Path(room_id): Path<RoomId>,
) -> AppResult<impl IntoResponse> {
    let room = state.registry().get(&room_id)?;

    Ok(Json(DataResponse { data: room }))
}

/// PUT /api/v1/rooms/{id}/occupancy
///
/// Manual correction. The status is re-derived; the response carries the
/// room as it stands afterwards.
pub async fn set_occupancy(
    State(state): State<AppState>,
    Path(room_id): Path<RoomId>,
    Json(input): Json<OccupancyOverride>,
) -> AppResult<impl IntoResponse> {
    let outcome = state.updater.set_occupancy(&room_id, input.occupancy)?;

    Ok(Json(DataResponse {
        data: outcome.room().clone(),
    }))
}

/// GET /api/v1/rooms/{id}/frame
///
/// The most recent frame a live loop sampled for this room.
pub async fn current_frame(
    State(state): State<AppState>,
    Path(room_id): Path<RoomId>,
) -> AppResult<impl IntoResponse> {
    state.registry().get(&room_id)?;
    latest_frame(&state, &room_id)
}

pub(crate) fn latest_frame(state: &AppState, room_id: &str) -> AppResult<impl IntoResponse> {
    let frame = state
        .sampling
        .frames()
        .latest(room_id)
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "Frame",
                id: room_id.to_string(),
            })
        })?;

    Ok(([(CONTENT_TYPE, frame.content_type)], frame.bytes))
}

// ---------------------------------------------------------------------------
// Unversioned dashboard API
// ---------------------------------------------------------------------------

/// Room shape served by `/api/rooms`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardRoom {
    pub id: RoomId,
    pub name: String,
    pub capacity: u32,
    pub current_occupancy: u32,
    pub status: RoomStatus,
    pub equipment: Vec<String>,
    pub last_update: Option<Timestamp>,
    pub video_feed: Option<String>,
}

impl From<Room> for DashboardRoom {
    fn from(room: Room) -> Self {
        Self {
            id: room.id,
            name: room.name,
            capacity: room.capacity,
            current_occupancy: room.occupancy,
            status: room.status,
            equipment: room.equipment,
            last_update: room.last_update,
            video_feed: room.video_feed,
        }
    }
}

/// Body of `PUT /api/rooms`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardOverride {
    pub room_id: RoomId,
    pub occupancy: u32,
}

/// GET /api/rooms
pub async fn list_rooms_bare(State(state): State<AppState>) -> Json<Vec<DashboardRoom>> {
    Json(
        state
            .registry()
            .list()
            .into_iter()
            .map(DashboardRoom::from)
            .collect(),
    )
}

/// PUT /api/rooms
pub async fn set_occupancy_bare(
    State(state): State<AppState>,
    Json(input): Json<DashboardOverride>,
) -> AppResult<Json<DashboardRoom>> {
    let outcome = state
        .updater
        .set_occupancy(&input.room_id, input.occupancy)?;

    Ok(Json(outcome.room().clone().into()))
}

/// GET /api/video/{id}/frame
pub async fn video_frame(
    State(state): State<AppState>,
    Path(room_id): Path<RoomId>,
) -> AppResult<impl IntoResponse> {
    if !state.registry().contains(&room_id) {
        return Err(AppError::BadRequest("Invalid room ID".to_string()));
    }
    latest_frame(&state, &room_id)
}
