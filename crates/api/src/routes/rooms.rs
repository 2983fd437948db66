//! Route definitions for the room query/update service.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::rooms;
use crate::state::AppState;

/// Room routes mounted at `/rooms`.
///
/// ```text
/// GET    /                  -> list_rooms
/// GET    /summary           -> summary
/// GET    /{id}              -> get_room
/// PUT    /{id}/occupancy    -> set_occupancy
/// GET    /{id}/frame        -> current_frame
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(rooms::list_rooms))
        .route("/summary", get(rooms::summary))
        .route("/{id}", get(rooms::get_room))
        .route("/{id}/occupancy", put(rooms::set_occupancy))
        .route("/{id}/frame", get(rooms::current_frame))
}
