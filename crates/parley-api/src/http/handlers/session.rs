//! Session transcript handler.
//!
//! Endpoint:
//! - GET /api/sessions/{id} - Fetch the stored transcript of a session

use axum::Json;
use axum::extract::{Path, State};

use parley_types::session::{SessionId, SessionRecord};

use crate::http::error::AppError;
use crate::state::AppState;

/// GET /api/sessions/{id} - Return the session record, turns in order.
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionRecord>, AppError> {
    let record = state
        .chat_service
        .transcript(&SessionId::from(id))
        .await?;
    Ok(Json(record))
}
