use std::sync::Arc;

use crate::config::SpotifyConfig;
use crate::rooms::events::EventSink;
use crate::rooms::registry::RoomRegistry;
use crate::spotify::PlaybackProvider;
use crate::users::UserRegistry;
use crate::ws::TopicRegistry;

/// Shared application state passed to all handlers via axum State extractor.
///
/// Everything here is process-lifetime in-memory state: initialized empty at
/// startup, discarded at shutdown. Transport code never touches room or user
/// internals directly; all mutation goes through the registries so the
/// locking discipline stays in one place.
#[derive(Clone)]
pub struct AppState {
    /// Room registry: every live room, with per-room locking inside
    pub rooms: Arc<RoomRegistry>,
    /// User registry: profile lookup for every current room member
    pub users: Arc<UserRegistry>,
    /// Active WebSocket connections per room topic
    pub topics: TopicRegistry,
    /// Fan-out the room operations use to notify topic subscribers
    pub events: Arc<dyn EventSink>,
    /// External playback provider (Spotify in production, stubbed in tests)
    pub provider: Arc<dyn PlaybackProvider>,
    /// Spotify OAuth settings for /login and /callback
    pub spotify: SpotifyConfig,
}
