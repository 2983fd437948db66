//! Tests for WebSocket connection management and the feed broadcaster.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::Message;
use chrono::Utc;
use roomwatch_api::broadcast::FeedBroadcaster;
use roomwatch_api::ws::WsManager;
use roomwatch_core::event::{RoomUpdateEvent, UpdateSource};
use roomwatch_core::room::{RoomConfig, SamplingMode};
use roomwatch_core::status::{RoomStatus, StatusPolicy};
use roomwatch_events::{EventBus, RoomFeed};
use roomwatch_registry::RoomRegistry;
use tokio_util::sync::CancellationToken;

// ---------------------------------------------------------------------------
// Test: connection bookkeeping
// ---------------------------------------------------------------------------

#[tokio::test]
async fn add_and_remove_connections() {
    let manager = WsManager::new();
    let _rx1 = manager.add("a".to_string()).await;
    let _rx2 = manager.add("b".to_string()).await;
    assert_eq!(manager.connection_count().await, 2);

    manager.remove("a").await;
    assert_eq!(manager.connection_count().await, 1);
    manager.remove("missing").await;
    assert_eq!(manager.connection_count().await, 1);
}

#[tokio::test]
async fn broadcast_reaches_every_connection() {
    let manager = WsManager::new();
    let mut rx1 = manager.add("a".to_string()).await;
    let mut rx2 = manager.add("b".to_string()).await;

    manager.broadcast(Message::Text("hello".into())).await;

    for rx in [&mut rx1, &mut rx2] {
        match rx.recv().await.unwrap() {
            Message::Text(text) => assert_eq!(text.as_str(), "hello"),
            other => panic!("unexpected message: {other:?}"),
        }
    }
}

#[tokio::test]
async fn send_to_targets_one_connection() {
    let manager = WsManager::new();
    let mut rx1 = manager.add("a".to_string()).await;
    let mut rx2 = manager.add("b".to_string()).await;

    assert!(manager.send_to("a", Message::Text("only a".into())).await);
    assert!(!manager.send_to("zzz", Message::Text("nobody".into())).await);

    assert!(rx1.try_recv().is_ok());
    assert!(rx2.try_recv().is_err());
}

#[tokio::test]
async fn shutdown_all_sends_close_and_clears() {
    let manager = WsManager::new();
    let mut rx = manager.add("a".to_string()).await;

    manager.shutdown_all().await;

    assert!(matches!(rx.recv().await, Some(Message::Close(None))));
    assert_eq!(manager.connection_count().await, 0);
}

#[tokio::test]
async fn ping_all_sends_ping() {
    let manager = WsManager::new();
    let mut rx = manager.add("a".to_string()).await;

    manager.ping_all().await;

    assert!(matches!(rx.recv().await, Some(Message::Ping(_))));
}

// ---------------------------------------------------------------------------
// Test: feed broadcaster
// ---------------------------------------------------------------------------

#[tokio::test]
async fn broadcaster_forwards_room_updates() {
    let config = RoomConfig {
        id: "room-1".to_string(),
        name: "Room".to_string(),
        capacity: 8,
        occupancy: 0,
        equipment: Vec::new(),
        video_feed: None,
        sampling_mode: SamplingMode::Live,
    };
    let registry = Arc::new(RoomRegistry::new(&[config], StatusPolicy::default()).unwrap());
    let bus = EventBus::default();
    let manager = Arc::new(WsManager::new());
    let mut rx = manager.add("client".to_string()).await;

    let cancel = CancellationToken::new();
    let handle = tokio::spawn(
        FeedBroadcaster::new(Arc::clone(&manager))
            .run(RoomFeed::new(&bus, registry), cancel.clone()),
    );

    bus.publish(RoomUpdateEvent {
        room_id: "room-1".to_string(),
        occupancy: 7,
        status: RoomStatus::Full,
        timestamp: Utc::now(),
        source: UpdateSource::Sampled,
    });

    let message = tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .unwrap()
        .unwrap();
    let Message::Text(text) = message else {
        panic!("expected a text frame");
    };
    let json: serde_json::Value = serde_json::from_str(text.as_str()).unwrap();
    assert_eq!(json["type"], "room.updated");
    assert_eq!(json["roomId"], "room-1");
    assert_eq!(json["status"], "full");

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .unwrap()
        .unwrap();
}
