pub mod events;
pub mod model;
pub mod registry;
pub mod routes;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::spotify::ProviderError;

/// Error taxonomy for room commands.
///
/// Every failure is reported synchronously to the command's caller; nothing
/// is retried internally. Retry is the caller's job.
#[derive(Debug)]
pub enum RoomError {
    RoomNotFound,
    NotInRoom,
    AlreadyMember,
    Provider(ProviderError),
    InvalidRequest(String),
}

impl std::fmt::Display for RoomError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoomError::RoomNotFound => write!(f, "Room not found"),
            RoomError::NotInRoom => write!(f, "User not in room"),
            RoomError::AlreadyMember => write!(f, "Already in room"),
            RoomError::Provider(e) => write!(f, "Playback provider error: {}", e),
            RoomError::InvalidRequest(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for RoomError {}

impl From<ProviderError> for RoomError {
    fn from(e: ProviderError) -> Self {
        RoomError::Provider(e)
    }
}

impl RoomError {
    fn status(&self) -> StatusCode {
        match self {
            RoomError::RoomNotFound => StatusCode::NOT_FOUND,
            RoomError::NotInRoom | RoomError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            RoomError::AlreadyMember => StatusCode::CONFLICT,
            RoomError::Provider(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for RoomError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (self.status(), body).into_response()
    }
}
