use super::state::AppState;
use crate::session::SessionInfo;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// GET /sessions
/// List active sessions
pub async fn list_sessions(State(state): State<AppState>) -> impl IntoResponse {
    let sessions: Vec<SessionInfo> = state.registry.infos().await;
    (StatusCode::OK, Json(sessions))
}

/// GET /sessions/:identity
/// Get status of one session
pub async fn get_session(
    State(state): State<AppState>,
    Path(identity): Path<String>,
) -> impl IntoResponse {
    match state.registry.lookup(&identity).await {
        Some(session) => (StatusCode::OK, Json(session.info().await)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Session {} not found", identity),
            }),
        )
            .into_response(),
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
