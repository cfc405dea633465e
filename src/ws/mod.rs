pub mod actor;
pub mod broadcast;
pub mod handler;

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Type alias for the sender half of a WebSocket connection's channel.
/// Other parts of the system can clone this to push messages to a specific client.
pub type ConnectionSender = mpsc::UnboundedSender<axum::extract::ws::Message>;

/// Topic registry: tracks all active WebSocket connections per room topic.
/// A connection can subscribe to multiple rooms, and a room usually has
/// multiple subscribed connections.
/// Arc<DashMap<RoomId, Vec<ConnectionSender>>>
pub type TopicRegistry = Arc<DashMap<String, Vec<ConnectionSender>>>;

/// Create a new empty topic registry.
pub fn new_topic_registry() -> TopicRegistry {
    Arc::new(DashMap::new())
}
