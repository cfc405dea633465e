use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Redirect,
    routing::get,
    Router,
};
use serde::Deserialize;

use crate::state::AppState;

const AUTHORIZE_URL: &str = "https://accounts.spotify.com/authorize";
const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

/// Playback read plus transport control, the scopes a host and its joiners
/// need to mirror playback.
const SCOPES: &str =
    "user-read-playback-state user-modify-playback-state user-read-currently-playing";

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// GET /login — Redirect the browser to Spotify's consent page.
pub async fn login(State(state): State<AppState>) -> Result<Redirect, (StatusCode, String)> {
    let url = reqwest::Url::parse_with_params(
        AUTHORIZE_URL,
        &[
            ("client_id", state.spotify.client_id.as_str()),
            ("response_type", "code"),
            ("redirect_uri", state.spotify.redirect_uri.as_str()),
            ("scope", SCOPES),
        ],
    )
    .map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Authorize URL: {}", e),
        )
    })?;
    Ok(Redirect::temporary(url.as_str()))
}

/// GET /callback — Exchange the authorization code for an access token and
/// hand the token back to the frontend via the redirect query string.
pub async fn callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Result<Redirect, (StatusCode, String)> {
    if let Some(error) = query.error {
        tracing::warn!(error = %error, "Authorization denied at consent page");
        return Err((StatusCode::BAD_REQUEST, format!("Authorization failed: {}", error)));
    }
    let code = query
        .code
        .ok_or((StatusCode::BAD_REQUEST, "Missing authorization code".to_string()))?;

    let response = reqwest::Client::new()
        .post(TOKEN_URL)
        .basic_auth(&state.spotify.client_id, Some(&state.spotify.client_secret))
        .form(&[
            ("grant_type", "authorization_code"),
            ("code", code.as_str()),
            ("redirect_uri", state.spotify.redirect_uri.as_str()),
        ])
        .send()
        .await
        .map_err(|e| (StatusCode::BAD_GATEWAY, format!("Token exchange: {}", e)))?;

    if !response.status().is_success() {
        let status = response.status();
        tracing::warn!(status = %status, "Token exchange rejected");
        return Err((StatusCode::BAD_GATEWAY, format!("Token exchange: {}", status)));
    }

    let token: TokenResponse = response
        .json()
        .await
        .map_err(|e| (StatusCode::BAD_GATEWAY, format!("Token response: {}", e)))?;

    let target = reqwest::Url::parse_with_params(
        &state.spotify.frontend_url,
        &[("token", token.access_token.as_str())],
    )
    .map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Frontend URL: {}", e),
        )
    })?;
    Ok(Redirect::temporary(target.as_str()))
}

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(login))
        .route("/callback", get(callback))
}
