use axum::Router;

use crate::rooms::routes::room_api;
use crate::spotify::auth::auth_routes;
use crate::state::AppState;
use crate::ws::handler::ws_routes;

/// Build the full axum Router with all routes.
pub fn build_router(state: AppState) -> Router {
    let health = Router::new().route("/health", axum::routing::get(health_check));

    Router::new()
        .merge(room_api())
        .merge(auth_routes())
        .merge(ws_routes())
        .merge(health)
        .with_state(state)
}

/// Basic health check endpoint
async fn health_check() -> &'static str {
    "ok"
}
