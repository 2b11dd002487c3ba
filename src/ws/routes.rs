use super::handlers;
use super::state::RelayState;
use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

/// Create the WebSocket router
///
/// Clients connect at the root path; `/ws` is accepted as an alias.
pub fn create_ws_router(state: RelayState) -> Router {
    Router::new()
        .route("/", get(handlers::ws_handler))
        .route("/ws", get(handlers::ws_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
