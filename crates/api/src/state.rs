use std::sync::Arc;

use spijker_db::RestStore;
use spijker_events::EventBus;
use spijker_pipeline::{GenerationManager, SharedGallery};

use crate::config::ServerConfig;
use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Session store client.
    pub store: RestStore,
    pub config: Arc<ServerConfig>,
    /// Owner of the active generation run.
    pub generations: Arc<GenerationManager>,
    /// The image gallery; the same instance the manager reconciles into.
    pub gallery: Arc<SharedGallery>,
    /// WebSocket connection manager (browser clients).
    pub ws_manager: Arc<WsManager>,
    /// Event bus for generation and gallery events.
    pub event_bus: Arc<EventBus>,
}
