//! Handlers for the append-only booking log.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use roomwatch_core::booking::NewBooking;
use roomwatch_core::error::CoreError;
use serde::Deserialize;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct BookingListParams {
    /// Return only the newest `limit` bookings, newest first.
    pub limit: Option<usize>,
}

/// GET /api/v1/bookings
pub async fn list_bookings(
    State(state): State<AppState>,
    Query(params): Query<BookingListParams>,
) -> AppResult<impl IntoResponse> {
    let bookings = match params.limit {
        Some(limit) => state.bookings.recent(limit),
        None => state.bookings.list(),
    };

    Ok(Json(DataResponse { data: bookings }))
}

/// POST /api/v1/bookings
///
/// No overlap checks: bookings are an append-only log.
pub async fn create_booking(
    State(state): State<AppState>,
    Json(input): Json<NewBooking>,
) -> AppResult<impl IntoResponse> {
    input.check()?;
    if !state.registry().contains(&input.room_id) {
        return Err(CoreError::Validation(format!("Unknown room: {}", input.room_id)).into());
    }

    let booking = state.bookings.append(input.into_booking());

    Ok((StatusCode::CREATED, Json(DataResponse { data: booking })))
}
