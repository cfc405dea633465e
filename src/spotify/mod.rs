pub mod auth;
pub mod client;

use async_trait::async_trait;

use crate::rooms::model::PlaybackSnapshot;

pub use client::SpotifyClient;

/// Failure surfaced by the playback provider.
#[derive(Debug)]
pub enum ProviderError {
    /// The credential was rejected (expired or revoked token).
    Auth(String),
    /// Network failure, timeout, or a 5xx from the provider.
    Transient(String),
    /// The provider answered with a body we could not interpret.
    Malformed(String),
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderError::Auth(msg) => write!(f, "provider rejected credential: {}", msg),
            ProviderError::Transient(msg) => write!(f, "provider unavailable: {}", msg),
            ProviderError::Malformed(msg) => write!(f, "unexpected provider response: {}", msg),
        }
    }
}

impl std::error::Error for ProviderError {}

/// External playback source queried at sync-request time.
///
/// `Ok(None)` means the credential is valid but nothing is playing on any
/// device. Tests substitute a stub so no suite talks to the real service.
#[async_trait]
pub trait PlaybackProvider: Send + Sync {
    async fn current_playback(
        &self,
        credential: &str,
    ) -> Result<Option<PlaybackSnapshot>, ProviderError>;
}
