use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};

use crate::state::AppState;
use crate::ws::message::FeedMessage;

/// HTTP handler that upgrades the connection to the room update feed.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Manage a single feed connection after upgrade.
///
/// 1. Registers the connection with `WsManager`.
/// 2. Queues a snapshot of every room so the client starts from current state.
/// 3. Spawns a sender task that forwards messages from the manager channel.
/// 4. Drains inbound frames until the client goes away, then cleans up.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let ws_manager = state.ws_manager.clone();
    let conn_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(conn_id = %conn_id, "WebSocket connected");

    let mut rx = ws_manager.add(conn_id.clone()).await;

    let snapshot = FeedMessage::Snapshot {
        rooms: state.registry().list(),
    };
    match snapshot.to_message() {
        Ok(message) => {
            ws_manager.send_to(&conn_id, message).await;
        }
        Err(e) => tracing::error!(conn_id = %conn_id, error = %e, "Failed to encode snapshot"),
    }

    let (mut sink, mut stream) = socket.split();

    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let closing = matches!(msg, Message::Close(_));
            if sink.send(msg).await.is_err() || closing {
                tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                break;
            }
        }
    });

    // The feed is one-way; inbound frames other than Close are ignored.
    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(conn_id = %conn_id, "Pong received");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    ws_manager.remove(&conn_id).await;
    send_task.abort();
    tracing::info!(conn_id = %conn_id, "WebSocket disconnected");
}
