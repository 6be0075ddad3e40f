use super::state::AppState;
use crate::avatar::AvatarVariant;
use crate::session::{Command, Snapshot};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Serialize;
use tracing::{error, info};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct VariantInfo {
    pub id: AvatarVariant,
    pub label: &'static str,
    pub description: &'static str,
    pub selected: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /session
/// Current session snapshot
pub async fn get_session(State(state): State<AppState>) -> Json<Snapshot> {
    Json(state.controller.snapshot())
}

/// POST /session/start
/// Begin a new exchange (the talk button)
pub async fn start_session(State(state): State<AppState>) -> impl IntoResponse {
    send_command(&state, Command::Start).await
}

/// POST /session/cancel
/// Abort whatever the current exchange is doing
pub async fn cancel_session(State(state): State<AppState>) -> impl IntoResponse {
    send_command(&state, Command::Cancel).await
}

/// POST /session/acknowledge
/// Dismiss a displayed error
pub async fn acknowledge_error(State(state): State<AppState>) -> impl IntoResponse {
    send_command(&state, Command::Acknowledge).await
}

/// GET /avatar
/// Frame the renderer should draw right now
pub async fn get_avatar(State(state): State<AppState>) -> impl IntoResponse {
    let frame = *state.avatar.borrow();
    Json(frame)
}

/// GET /avatar/variants
pub async fn list_variants(State(state): State<AppState>) -> Json<Vec<VariantInfo>> {
    let selected = state.variant();
    Json(
        AvatarVariant::ALL
            .iter()
            .map(|&variant| VariantInfo {
                id: variant,
                label: variant.label(),
                description: variant.description(),
                selected: variant == selected,
            })
            .collect(),
    )
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn send_command(state: &AppState, command: Command) -> axum::response::Response {
    info!("HTTP command: {:?}", command);

    match state.controller.send(command).await {
        Ok(()) => (StatusCode::ACCEPTED, Json(state.controller.snapshot())).into_response(),
        Err(e) => {
            error!("Failed to deliver {:?}: {}", command, e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorResponse {
                    error: format!("{:#}", e),
                }),
            )
                .into_response()
        }
    }
}
