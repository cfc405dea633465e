use clap::Parser;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Syncroom coordination server
#[derive(Parser, Serialize, Deserialize, Clone, Debug)]
#[command(
    name = "syncroom-server",
    version,
    about = "Coordination server for synchronized music playback rooms"
)]
pub struct Config {
    /// Port to listen on
    #[arg(long, env = "SYNCROOM_PORT", default_value = "5000")]
    pub port: u16,

    /// Bind address
    #[arg(long, env = "SYNCROOM_BIND_ADDRESS", default_value = "0.0.0.0")]
    pub bind_address: String,

    /// Path to TOML config file
    #[arg(long, default_value = "./syncroom.toml")]
    pub config: String,

    /// Enable structured JSON logging (for Docker/production)
    #[arg(long, env = "SYNCROOM_JSON_LOGS")]
    pub json_logs: bool,

    /// Output a commented TOML config template and exit
    #[arg(long)]
    pub generate_config: bool,

    /// Spotify integration settings (loaded from [spotify] section in TOML)
    #[arg(skip)]
    #[serde(default)]
    pub spotify: SpotifyConfig,
}

/// Configuration for the Spotify OAuth flow and playback provider client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyConfig {
    /// OAuth application client id
    #[serde(default)]
    pub client_id: String,

    /// OAuth application client secret
    #[serde(default)]
    pub client_secret: String,

    /// Redirect URI registered with the Spotify application
    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,

    /// Frontend URL the OAuth callback redirects back to (token appended as
    /// a query parameter)
    #[serde(default = "default_frontend_url")]
    pub frontend_url: String,

    /// Timeout in seconds for playback provider API calls (default: 10)
    #[serde(default = "default_provider_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for SpotifyConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            redirect_uri: default_redirect_uri(),
            frontend_url: default_frontend_url(),
            request_timeout_secs: default_provider_timeout(),
        }
    }
}

fn default_redirect_uri() -> String {
    "http://localhost:5000/callback".to_string()
}

fn default_frontend_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_provider_timeout() -> u64 {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 5000,
            bind_address: "0.0.0.0".to_string(),
            config: "./syncroom.toml".to_string(),
            json_logs: false,
            generate_config: false,
            spotify: SpotifyConfig::default(),
        }
    }
}

impl Config {
    /// Load config with layered precedence:
    /// built-in defaults < TOML file < env vars (SYNCROOM_*) < CLI args
    pub fn load() -> Result<Self, figment::Error> {
        let cli = Config::parse();
        let config_path = cli.config.clone();

        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_path))
            .merge(Env::prefixed("SYNCROOM_"))
            .merge(Serialized::defaults(cli))
            .extract()
    }
}

/// Generate a commented TOML config template
pub fn generate_config_template() -> String {
    r#"# Syncroom Server Configuration
# Place this file at ./syncroom.toml or specify with --config <path>
# All settings can be overridden via environment variables (SYNCROOM_PORT, etc.)
# or CLI flags (--port, etc.)

# Server port (default: 5000)
# port = 5000

# Bind address (default: 0.0.0.0, all interfaces)
# bind_address = "0.0.0.0"

# Enable structured JSON logging for Docker/production
# json_logs = false

# ---- Spotify Integration ----
# [spotify]

# OAuth application credentials from https://developer.spotify.com/dashboard
# client_id = ""
# client_secret = ""

# Redirect URI registered with the Spotify application
# redirect_uri = "http://localhost:5000/callback"

# Frontend URL the OAuth callback hands the access token to
# frontend_url = "http://localhost:5000"

# Timeout in seconds for playback provider API calls
# request_timeout_secs = 10
"#
    .to_string()
}
