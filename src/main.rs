mod config;
mod rooms;
mod routes;
mod spotify;
mod state;
mod users;
mod ws;

use std::sync::Arc;
use tokio::net::TcpListener;

use config::{generate_config_template, Config};
use rooms::registry::RoomRegistry;
use spotify::SpotifyClient;
use users::UserRegistry;
use ws::broadcast::WsFanout;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load config with layered precedence: defaults < TOML < env < CLI
    let config = Config::load()?;

    // Handle --generate-config: print template and exit
    if config.generate_config {
        print!("{}", generate_config_template());
        return Ok(());
    }

    // Initialize tracing/logging
    if config.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "syncroom_server=info".parse().unwrap()),
            )
            .init();
    } else {
        tracing_subscriber::fmt()
            .pretty()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "syncroom_server=info".parse().unwrap()),
            )
            .init();
    }

    tracing::info!("Syncroom server v{} starting", env!("CARGO_PKG_VERSION"));

    if config.spotify.client_id.is_empty() || config.spotify.client_secret.is_empty() {
        tracing::warn!(
            "Spotify credentials not configured; /login and /callback will not work. \
             Set [spotify] client_id and client_secret in the config file."
        );
    }

    // Build application state: topic registry first, since the room fan-out
    // and the WebSocket handlers share it.
    let topics = ws::new_topic_registry();
    let provider = SpotifyClient::new(&config.spotify)?;

    let app_state = state::AppState {
        rooms: Arc::new(RoomRegistry::new()),
        users: Arc::new(UserRegistry::new()),
        topics: topics.clone(),
        events: Arc::new(WsFanout::new(topics)),
        provider: Arc::new(provider),
        spotify: config.spotify.clone(),
    };

    // Build router
    let app = routes::build_router(app_state);

    // Bind and serve
    let addr = format!("{}:{}", config.bind_address, config.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
