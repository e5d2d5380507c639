//! Chat exchange handler.
//!
//! Endpoint:
//! - POST /api/chat - Send a message, optionally continuing a session

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use serde::{Deserialize, Serialize};

use parley_types::session::SessionId;

use crate::http::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    /// Omitted, null or empty starts a new session.
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub message: String,
    pub session_id: String,
}

/// POST /api/chat - Run one exchange and return the reply with its session id.
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    let Json(request) = payload?;

    let session_id = request
        .session_id
        .filter(|id| !id.is_empty())
        .map(SessionId::from);

    let reply = state
        .chat_service
        .exchange(request.message, session_id)
        .await?;

    Ok(Json(ChatResponse {
        message: reply.message,
        session_id: reply.session_id.into_inner(),
    }))
}
