use crate::rooms::events::{EventSink, RoomEvent};

use super::TopicRegistry;

/// Broadcast a room event to every connection subscribed to the room's topic.
pub fn publish_to_topic(registry: &TopicRegistry, room_id: &str, event: &RoomEvent) {
    let text = match serde_json::to_string(event) {
        Ok(text) => text,
        Err(e) => {
            tracing::error!(room_id = %room_id, error = %e, "Event serialization failed");
            return;
        }
    };
    let msg = axum::extract::ws::Message::Text(text.into());

    if let Some(connections) = registry.get(room_id) {
        for sender in connections.value().iter() {
            // A failed send means the subscriber's actor already exited; its
            // sender gets swept on unsubscribe.
            let _ = sender.send(msg.clone());
        }
    }
}

/// EventSink backed by the WebSocket topic registry. This is the production
/// fan-out; tests swap in a recording sink.
pub struct WsFanout {
    topics: TopicRegistry,
}

impl WsFanout {
    pub fn new(topics: TopicRegistry) -> Self {
        Self { topics }
    }
}

impl EventSink for WsFanout {
    fn publish(&self, room_id: &str, event: &RoomEvent) {
        publish_to_topic(&self.topics, room_id, event);
    }
}
