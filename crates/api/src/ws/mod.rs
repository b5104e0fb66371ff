//! WebSocket infrastructure for streaming generation and gallery events.
//!
//! Provides connection management, heartbeat monitoring, the HTTP upgrade
//! handler, and the forwarder that relays event bus traffic to clients.

mod forwarder;
mod handler;
mod heartbeat;
pub mod manager;

pub use forwarder::EventForwarder;
pub use handler::ws_handler;
pub use heartbeat::start_heartbeat;
pub use manager::WsManager;
