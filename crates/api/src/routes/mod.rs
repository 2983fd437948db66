pub mod bookings;
pub mod compat;
pub mod health;
pub mod rooms;
pub mod sampling;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /ws                                  WebSocket room update feed
///
/// /rooms                               list rooms
/// /rooms/summary                       status counts
/// /rooms/{id}                          get room
/// /rooms/{id}/occupancy                manual override (PUT)
/// /rooms/{id}/frame                    current frame image
/// /rooms/{id}/sampling/start           start loop (POST)
/// /rooms/{id}/sampling/stop            stop loop (POST)
///
/// /sampling                            loop state per room
///
/// /bookings                            list, create
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .nest("/rooms", rooms::router().merge(sampling::room_router()))
        .nest("/sampling", sampling::router())
        .nest("/bookings", bookings::router())
}
