//! Relays event bus traffic to WebSocket clients.

use std::sync::Arc;

use axum::extract::ws::Message;
use spijker_events::GenerationEvent;
use tokio::sync::broadcast;

use crate::ws::WsManager;

/// Broadcasts every [`GenerationEvent`] to all connected clients as a JSON
/// text frame.
pub struct EventForwarder {
    ws_manager: Arc<WsManager>,
}

impl EventForwarder {
    pub fn new(ws_manager: Arc<WsManager>) -> Self {
        Self { ws_manager }
    }

    /// Run until the event bus is dropped.
    pub async fn run(self, mut receiver: broadcast::Receiver<GenerationEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => self.forward(&event).await,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Event forwarder lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, event forwarder shutting down");
                    break;
                }
            }
        }
    }

    async fn forward(&self, event: &GenerationEvent) {
        match serde_json::to_string(event) {
            Ok(json) => self.ws_manager.broadcast(Message::Text(json.into())).await,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    event_type = %event.event_type,
                    "Failed to serialize event"
                );
            }
        }
    }
}
