use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::model::{LeaveOutcome, Member, ReadyProgress, RoomSnapshot};
use super::RoomError;
use crate::state::AppState;
use crate::users::UserProfile;

// --- Request types ---

#[derive(Debug, Deserialize)]
pub struct CreateRoomRequest {
    pub user_id: Option<String>,
    pub display_name: Option<String>,
    pub credential: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct JoinRoomRequest {
    pub user_id: Option<String>,
    pub display_name: Option<String>,
    pub credential: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LeaveRoomRequest {
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct TransferHostRequest {
    pub new_host_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ReadyRequest {
    pub user_id: String,
}

// --- Response types ---

#[derive(Debug, Serialize)]
pub struct RoomResponse {
    pub user_id: String,
    #[serde(flatten)]
    pub room: RoomSnapshot,
}

#[derive(Debug, Serialize)]
pub struct LeaveResponse {
    pub room_deleted: bool,
    pub promoted_host: Option<String>,
    pub room: Option<RoomSnapshot>,
}

// --- Handlers ---

fn member_from(
    user_id: Option<String>,
    display_name: Option<String>,
    credential: Option<String>,
    default_name: &str,
) -> Member {
    Member {
        user_id: user_id.unwrap_or_else(|| Uuid::new_v4().to_string()),
        display_name: display_name.unwrap_or_else(|| default_name.to_string()),
        is_host: false,
        credential,
    }
}

/// POST /api/rooms — Create a room with the caller as host.
pub async fn create_room(
    State(state): State<AppState>,
    Json(req): Json<CreateRoomRequest>,
) -> (StatusCode, Json<RoomResponse>) {
    let host = member_from(req.user_id, req.display_name, req.credential, "Host");
    let user_id = host.user_id.clone();

    state.users.insert(UserProfile {
        user_id: user_id.clone(),
        display_name: host.display_name.clone(),
        is_host: true,
        credential: host.credential.clone(),
    });

    let (room_id, room) = state.rooms.create_room(host);
    tracing::info!(room_id = %room_id, host_id = %user_id, "Room created");

    (StatusCode::CREATED, Json(RoomResponse { user_id, room }))
}

/// GET /api/rooms/{id} — Current room snapshot.
pub async fn get_room(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomSnapshot>, RoomError> {
    let room = state.rooms.snapshot(&room_id).await?;
    Ok(Json(room))
}

/// POST /api/rooms/{id}/join — Join an existing room as a non-host member.
pub async fn join_room(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Json(req): Json<JoinRoomRequest>,
) -> Result<Json<RoomResponse>, RoomError> {
    let member = member_from(req.user_id, req.display_name, req.credential, "Joiner");
    let user_id = member.user_id.clone();
    let profile = UserProfile {
        user_id: user_id.clone(),
        display_name: member.display_name.clone(),
        is_host: false,
        credential: member.credential.clone(),
    };

    let room = state
        .rooms
        .join(&room_id, member, state.events.as_ref())
        .await?;
    state.users.insert(profile);
    tracing::info!(room_id = %room_id, user_id = %user_id, "User joined room");

    Ok(Json(RoomResponse { user_id, room }))
}

/// POST /api/rooms/{id}/leave — Leave a room. Deletes the room when the last
/// member leaves, promotes a new host when the host leaves.
pub async fn leave_room(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Json(req): Json<LeaveRoomRequest>,
) -> Result<Json<LeaveResponse>, RoomError> {
    let outcome = state
        .rooms
        .leave(&room_id, &req.user_id, state.events.as_ref())
        .await?;
    state.users.remove(&req.user_id);

    let response = match outcome {
        LeaveOutcome::Left {
            room,
            promoted_host,
        } => {
            if let Some(new_host_id) = &promoted_host {
                state.users.set_host(new_host_id, true);
                tracing::info!(room_id = %room_id, new_host_id = %new_host_id, "Host left, promoted new host");
            }
            LeaveResponse {
                room_deleted: false,
                promoted_host,
                room: Some(room),
            }
        }
        LeaveOutcome::RoomDeleted => LeaveResponse {
            room_deleted: true,
            promoted_host: None,
            room: None,
        },
    };
    Ok(Json(response))
}

/// POST /api/rooms/{id}/transfer-host — Hand the host role to another member.
pub async fn transfer_host(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Json(req): Json<TransferHostRequest>,
) -> Result<Json<RoomSnapshot>, RoomError> {
    let before = state.rooms.snapshot(&room_id).await?;
    let room = state
        .rooms
        .transfer_host(&room_id, &req.new_host_id, state.events.as_ref())
        .await?;

    state.users.set_host(&before.host_id, false);
    state.users.set_host(&req.new_host_id, true);
    tracing::info!(room_id = %room_id, new_host_id = %req.new_host_id, "Host transferred");

    Ok(Json(room))
}

/// POST /api/rooms/{id}/sync — Capture the host's playback and start a
/// readiness handshake across the room's joiners.
pub async fn request_sync(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomSnapshot>, RoomError> {
    let room = state
        .rooms
        .request_sync(&room_id, state.provider.as_ref(), state.events.as_ref())
        .await?;
    Ok(Json(room))
}

/// POST /api/rooms/{id}/ready — Acknowledge readiness for the current
/// handshake. Host acks are accepted but never counted.
pub async fn mark_ready(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Json(req): Json<ReadyRequest>,
) -> Result<Json<ReadyProgress>, RoomError> {
    let progress = state
        .rooms
        .mark_ready(&room_id, &req.user_id, state.events.as_ref())
        .await?;
    Ok(Json(progress))
}

pub fn room_api() -> Router<AppState> {
    Router::new()
        .route("/api/rooms", post(create_room))
        .route("/api/rooms/{id}", get(get_room))
        .route("/api/rooms/{id}/join", post(join_room))
        .route("/api/rooms/{id}/leave", post(leave_room))
        .route("/api/rooms/{id}/transfer-host", post(transfer_host))
        .route("/api/rooms/{id}/sync", post(request_sync))
        .route("/api/rooms/{id}/ready", post(mark_ready))
}
