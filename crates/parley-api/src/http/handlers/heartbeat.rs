//! Liveness endpoint.

use axum::Json;
use axum::extract::State;
use serde_json::{Value, json};

use crate::http::error::AppError;
use crate::state::AppState;

/// GET /api/heartbeat - Liveness plus the number of stored sessions.
pub async fn heartbeat(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let sessions = state.chat_service.session_count().await?;
    Ok(Json(json!({
        "message": "API is running !",
        "sessions": sessions,
    })))
}
