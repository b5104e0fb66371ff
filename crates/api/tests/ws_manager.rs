//! Unit tests for `WsManager` and the event forwarder.
//!
//! These exercise connection bookkeeping and broadcast delivery directly,
//! without performing any HTTP upgrades.

use std::sync::Arc;

use axum::extract::ws::Message;
use spijker_api::ws::{EventForwarder, WsManager};
use spijker_events::{event_types, EventBus, GenerationEvent};

#[tokio::test]
async fn add_and_remove_track_connection_count() {
    let manager = WsManager::new();
    assert_eq!(manager.connection_count().await, 0);

    let _rx1 = manager.add("conn-1".to_string()).await;
    let _rx2 = manager.add("conn-2".to_string()).await;
    assert_eq!(manager.connection_count().await, 2);

    manager.remove("conn-1").await;
    manager.remove("nonexistent").await;
    assert_eq!(manager.connection_count().await, 1);
}

#[tokio::test]
async fn broadcast_reaches_every_connection() {
    let manager = WsManager::new();
    let mut rx1 = manager.add("conn-1".to_string()).await;
    let mut rx2 = manager.add("conn-2".to_string()).await;

    manager.broadcast(Message::Text("hello".into())).await;

    for rx in [&mut rx1, &mut rx2] {
        match rx.recv().await.unwrap() {
            Message::Text(text) => assert_eq!(text.as_str(), "hello"),
            other => panic!("expected Text, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn broadcast_skips_closed_receivers() {
    let manager = WsManager::new();
    let rx1 = manager.add("conn-1".to_string()).await;
    let mut rx2 = manager.add("conn-2".to_string()).await;
    drop(rx1);

    manager.broadcast(Message::Text("still here".into())).await;
    assert!(matches!(rx2.recv().await, Some(Message::Text(_))));
}

#[tokio::test]
async fn shutdown_all_sends_close_and_clears() {
    let manager = WsManager::new();
    let mut rx = manager.add("conn-1".to_string()).await;

    manager.shutdown_all().await;

    assert!(matches!(rx.recv().await, Some(Message::Close(None))));
    assert_eq!(manager.connection_count().await, 0);
}

#[tokio::test]
async fn ping_all_sends_ping_frames() {
    let manager = WsManager::new();
    let mut rx = manager.add("conn-1".to_string()).await;

    manager.ping_all().await;

    assert!(matches!(rx.recv().await, Some(Message::Ping(_))));
}

#[tokio::test]
async fn forwarder_relays_bus_events_as_json_and_stops_when_bus_drops() {
    let manager = Arc::new(WsManager::new());
    let mut rx = manager.add("conn-1".to_string()).await;

    let bus = EventBus::default();
    let handle = tokio::spawn(EventForwarder::new(Arc::clone(&manager)).run(bus.subscribe()));

    let session_id = uuid::Uuid::now_v7();
    bus.publish(
        GenerationEvent::new(event_types::GENERATION_PROGRESS)
            .with_session(session_id)
            .with_payload(serde_json::json!({ "found": 3 })),
    );

    let text = match rx.recv().await.unwrap() {
        Message::Text(text) => text,
        other => panic!("expected Text, got {other:?}"),
    };
    let json: serde_json::Value = serde_json::from_str(text.as_str()).unwrap();
    assert_eq!(json["event_type"], event_types::GENERATION_PROGRESS);
    assert_eq!(json["session_id"], session_id.to_string());
    assert_eq!(json["payload"]["found"], 3);

    drop(bus);
    tokio::time::timeout(std::time::Duration::from_secs(5), handle)
        .await
        .expect("forwarder should stop once the bus is dropped")
        .unwrap();
}
