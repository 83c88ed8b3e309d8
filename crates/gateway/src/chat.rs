use crate::error::ApiError;
use crate::{RequestGuard, SharedState};
use aura_core::decision::{RouterDecision, RouterRequest};
use axum::Json;
use axum::extract::State;
use tracing::info;

/// `POST /api/chat`: one routed turn.
///
/// Answers `{response}` or the raw navigation object.
pub async fn chat(
    State(state): State<SharedState>,
    Json(req): Json<RouterRequest>,
) -> Result<Json<RouterDecision>, ApiError> {
    if req.message.trim().is_empty() {
        return Err(ApiError::BadRequest("message must not be empty".into()));
    }
    info!(user = %req.user_id, message_len = req.message.len(), "Chat request");

    let guard = RequestGuard::new();
    let decision = state.agents.router().route(&req, guard.token()).await?;
    Ok(Json(decision))
}
