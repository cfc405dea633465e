use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{PlaybackProvider, ProviderError};
use crate::config::SpotifyConfig;
use crate::rooms::model::PlaybackSnapshot;

const PLAYER_URL: &str = "https://api.spotify.com/v1/me/player";

/// Spotify Web API playback client.
pub struct SpotifyClient {
    http: reqwest::Client,
}

impl SpotifyClient {
    pub fn new(config: &SpotifyConfig) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ProviderError::Transient(e.to_string()))?;
        Ok(Self { http })
    }
}

// --- Wire types (subset of the player response we care about) ---

#[derive(Debug, Deserialize)]
struct PlayerResponse {
    item: Option<TrackItem>,
    is_playing: bool,
    #[serde(default)]
    progress_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct TrackItem {
    id: Option<String>,
    name: String,
    uri: String,
    #[serde(default)]
    artists: Vec<ArtistRef>,
}

#[derive(Debug, Deserialize)]
struct ArtistRef {
    name: String,
}

impl From<PlayerResponse> for PlaybackSnapshot {
    fn from(p: PlayerResponse) -> Self {
        let (track_id, track_name, artists, uri) = match p.item {
            Some(item) => (
                item.id,
                Some(item.name),
                item.artists.into_iter().map(|a| a.name).collect(),
                Some(item.uri),
            ),
            None => (None, None, Vec::new(), None),
        };
        PlaybackSnapshot {
            track_id,
            track_name,
            artists,
            uri,
            is_playing: p.is_playing,
            position_ms: p.progress_ms.unwrap_or(0),
        }
    }
}

#[async_trait]
impl PlaybackProvider for SpotifyClient {
    /// GET /v1/me/player with the member's bearer token. Spotify answers 204
    /// with an empty body when no device is active.
    async fn current_playback(
        &self,
        credential: &str,
    ) -> Result<Option<PlaybackSnapshot>, ProviderError> {
        let response = self
            .http
            .get(PLAYER_URL)
            .bearer_auth(credential)
            .send()
            .await
            .map_err(|e| ProviderError::Transient(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NO_CONTENT {
            return Ok(None);
        }
        if status == reqwest::StatusCode::UNAUTHORIZED
            || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(ProviderError::Auth(format!("player request: {}", status)));
        }
        if !status.is_success() {
            return Err(ProviderError::Transient(format!(
                "player request: {}",
                status
            )));
        }

        let player: PlayerResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;
        Ok(Some(player.into()))
    }
}
