//! In-process event bus for generation and gallery events.
//!
//! - [`EventBus`]: publish/subscribe hub backed by `tokio::sync::broadcast`.
//! - [`GenerationEvent`]: the event envelope streamed to WebSocket clients.
//! - [`event_types`]: the dot-separated event names.

pub mod bus;
pub mod event_types;

pub use bus::{EventBus, GenerationEvent};
