//! WebSocket subscription feed.
//!
//! Provides connection management, heartbeat pings, the wire message
//! format and the HTTP upgrade handler used by Axum routes.

mod handler;
mod heartbeat;
pub mod manager;
pub mod message;

pub use handler::ws_handler;
pub use heartbeat::start_heartbeat;
pub use manager::WsManager;
pub use message::FeedMessage;
