//! Route definitions for sampling loop control.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::sampling;
use crate::state::AppState;

/// Per-room control routes, merged into the `/rooms` router.
///
/// ```text
/// POST   /{id}/sampling/start   -> start_sampling
/// POST   /{id}/sampling/stop    -> stop_sampling
/// ```
pub fn room_router() -> Router<AppState> {
    Router::new()
        .route("/{id}/sampling/start", post(sampling::start_sampling))
        .route("/{id}/sampling/stop", post(sampling::stop_sampling))
}

/// Overview routes mounted at `/sampling`.
///
/// ```text
/// GET    /                      -> list_states
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(sampling::list_states))
}
