use std::time::Duration;

use thiserror::Error;

use crate::llm::LlmError;
use crate::session::SessionId;

/// Errors from store operations (used by trait definitions in parley-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors from the session lifecycle manager.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session '{0}' not found")]
    NotFound(SessionId),

    #[error("no session is bound to this manager")]
    Unbound,

    #[error("persistence failure: {0}")]
    Persistence(#[from] RepositoryError),
}

/// Errors from a chat exchange, as reported to the boundary.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    #[error("session '{0}' not found")]
    SessionNotFound(SessionId),

    /// `retained` names the session holding the unanswered user turn, when
    /// the failure policy saved it.
    #[error("responder failed: {source}")]
    Responder {
        #[source]
        source: LlmError,
        retained: Option<SessionId>,
    },

    #[error("responder timed out after {after:?}")]
    ResponderTimeout {
        after: Duration,
        retained: Option<SessionId>,
    },

    #[error("persistence failure: {0}")]
    Persistence(String),
}

impl ChatError {
    /// The session that kept the user turn of a failed exchange, if any.
    pub fn retained_session(&self) -> Option<&SessionId> {
        match self {
            ChatError::Responder { retained, .. } | ChatError::ResponderTimeout { retained, .. } => {
                retained.as_ref()
            }
            _ => None,
        }
    }

    /// Attach the session that kept the user turn. Only responder failures
    /// carry one; other variants are returned unchanged.
    pub fn with_retained_session(self, session_id: SessionId) -> Self {
        match self {
            ChatError::Responder { source, .. } => ChatError::Responder {
                source,
                retained: Some(session_id),
            },
            ChatError::ResponderTimeout { after, .. } => ChatError::ResponderTimeout {
                after,
                retained: Some(session_id),
            },
            other => other,
        }
    }
}

impl From<LlmError> for ChatError {
    fn from(e: LlmError) -> Self {
        match e {
            LlmError::Timeout(after) => ChatError::ResponderTimeout {
                after,
                retained: None,
            },
            source => ChatError::Responder {
                source,
                retained: None,
            },
        }
    }
}

impl From<SessionError> for ChatError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::NotFound(id) => ChatError::SessionNotFound(id),
            SessionError::Persistence(inner) => ChatError::Persistence(inner.to_string()),
            other @ SessionError::Unbound => ChatError::Persistence(other.to_string()),
        }
    }
}
