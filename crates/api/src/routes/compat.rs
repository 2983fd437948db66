//! Unversioned routes mounted at `/api`.
//!
//! These keep the request and response shapes of the original dashboard
//! endpoints (bare JSON, no `data` envelope) so existing clients keep
//! working against this server.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{detect, rooms};
use crate::state::AppState;

/// Largest accepted frame upload.
const MAX_FRAME_BYTES: usize = 10 * 1024 * 1024;

/// ```text
/// POST   /detect            -> detect (multipart roomId, frame)
/// GET    /rooms             -> list_rooms_bare
/// PUT    /rooms             -> set_occupancy_bare {roomId, occupancy}
/// GET    /video/{id}/frame  -> video_frame
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/detect",
            post(detect::detect).layer(DefaultBodyLimit::max(MAX_FRAME_BYTES)),
        )
        .route(
            "/rooms",
            get(rooms::list_rooms_bare).put(rooms::set_occupancy_bare),
        )
        .route("/video/{id}/frame", get(rooms::video_frame))
}
