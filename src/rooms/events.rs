use serde::Serialize;

use super::model::{MemberInfo, PlaybackSnapshot, RoomSnapshot};

/// Room-state change events delivered to every connection subscribed to the
/// room's topic. Serialized as tagged JSON text frames.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoomEvent {
    UserJoined {
        user: MemberInfo,
        room: RoomSnapshot,
    },
    UserLeft {
        user_id: String,
        room: RoomSnapshot,
    },
    RoomDeleted {
        room_id: String,
    },
    HostTransferred {
        old_host_id: String,
        new_host_id: String,
        room: RoomSnapshot,
    },
    SyncRequested {
        playback: Option<PlaybackSnapshot>,
        room: RoomSnapshot,
    },
    AllReady {
        playback: Option<PlaybackSnapshot>,
        room: RoomSnapshot,
    },
}

/// Fan-out seam between the room aggregate and the transport layer.
///
/// Delivery is fire-and-forget: implementations must never surface
/// per-subscriber failures back to the triggering command. Tests substitute
/// a recording sink.
pub trait EventSink: Send + Sync {
    fn publish(&self, room_id: &str, event: &RoomEvent);
}
