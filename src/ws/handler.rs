use axum::{
    extract::{ws::WebSocketUpgrade, Query, State},
    response::Response,
    routing::get,
    Router,
};
use serde::Deserialize;

use crate::state::AppState;
use crate::ws::actor;

/// Query parameters for WebSocket connection. The optional room_id is an
/// initial subscription; further topics are managed with subscribe frames.
#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub room_id: Option<String>,
}

/// GET /ws?room_id=ID
/// WebSocket upgrade endpoint. Spawns an actor for the connection.
pub async fn ws_upgrade(
    State(state): State<AppState>,
    Query(params): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| actor::run_connection(socket, state, params.room_id))
}

pub fn ws_routes() -> Router<AppState> {
    Router::new().route("/ws", get(ws_upgrade))
}
