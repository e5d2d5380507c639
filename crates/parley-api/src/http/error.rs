//! Application error type mapping to HTTP status codes.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use parley_types::error::ChatError;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Failure from a chat exchange or transcript lookup.
    Chat(ChatError),
    /// Request body could not be read as the expected JSON.
    Validation(String),
}

impl From<ChatError> for AppError {
    fn from(e: ChatError) -> Self {
        AppError::Chat(e)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Chat(ChatError::InvalidMessage(_)) => StatusCode::BAD_REQUEST,
            AppError::Chat(ChatError::SessionNotFound(_)) => StatusCode::NOT_FOUND,
            AppError::Chat(ChatError::Responder { .. }) => StatusCode::BAD_GATEWAY,
            AppError::Chat(ChatError::ResponderTimeout { .. }) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Chat(ChatError::Persistence(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn detail(&self) -> String {
        match self {
            AppError::Chat(e) => e.to_string(),
            AppError::Validation(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = self.detail();
        let retained = match &self {
            AppError::Chat(e) => e.retained_session().cloned(),
            AppError::Validation(_) => None,
        };

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), %detail, "request failed");
        } else {
            tracing::debug!(status = status.as_u16(), %detail, "request rejected");
        }

        let body = match retained {
            Some(session_id) => json!({ "detail": detail, "session_id": session_id }),
            None => json!({ "detail": detail }),
        };
        (status, Json(body)).into_response()
    }
}
