//! Session lifecycle manager.
//!
//! A `SessionManager` is a per-request handle bound to at most one session.
//! It keeps the working transcript in memory; nothing reaches the store
//! until `save_session` is called, so a caller can append the user turn and
//! the assistant turn before committing either. A freshly created session
//! is written on its first save; until then it exists only in this handle.
//!
//! State machine: `Unbound -> Bound` on `create_session` or a successful
//! `load_session`; `Bound -> Bound` on `append`, `save_session`, and on any
//! later create/load (rebinding). There is no way back to `Unbound`.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use parley_types::error::{RepositoryError, SessionError};
use parley_types::session::{SessionId, SessionRecord, Turn};

use super::store::SessionStore;

/// Attempts at generating a fresh id before a conflict is reported.
const CREATE_ATTEMPTS: u32 = 3;

#[derive(Debug)]
enum Binding {
    Unbound,
    Bound {
        session_id: SessionId,
        context: Vec<Turn>,
        /// Whether the store already holds a record for `session_id`.
        persisted: bool,
    },
}

/// Handle over one session's mutable in-memory context.
pub struct SessionManager<S: SessionStore> {
    store: Arc<S>,
    binding: Binding,
}

impl<S: SessionStore> SessionManager<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            binding: Binding::Unbound,
        }
    }

    /// Allocate an id unused in the store and bind an empty transcript to
    /// this handle. The store is not written until `save_session`.
    pub async fn create_session(&mut self) -> Result<SessionId, SessionError> {
        for attempt in 1..=CREATE_ATTEMPTS {
            let session_id = SessionId::generate();
            if self.store.get(&session_id).await?.is_some() {
                warn!(attempt, session_id = %session_id, "Session id collision, regenerating");
                continue;
            }
            debug!(session_id = %session_id, "Session created");
            self.binding = Binding::Bound {
                session_id: session_id.clone(),
                context: Vec::new(),
                persisted: false,
            };
            return Ok(session_id);
        }
        Err(SessionError::Persistence(RepositoryError::Conflict(format!(
            "no free session id after {CREATE_ATTEMPTS} attempts"
        ))))
    }

    /// Bind the persisted transcript of `session_id`, replacing whatever
    /// this handle held. An unknown id is an error, never an empty session.
    pub async fn load_session(&mut self, session_id: &SessionId) -> Result<(), SessionError> {
        let record = self
            .store
            .get(session_id)
            .await?
            .ok_or_else(|| SessionError::NotFound(session_id.clone()))?;

        debug!(session_id = %session_id, turns = record.context.len(), "Session loaded");
        self.binding = Binding::Bound {
            session_id: record.session_id,
            context: record.context,
            persisted: true,
        };
        Ok(())
    }

    /// Append a turn to the in-memory context. Not durable until saved.
    pub fn append(&mut self, turn: Turn) -> Result<(), SessionError> {
        match &mut self.binding {
            Binding::Bound { context, .. } => {
                context.push(turn);
                Ok(())
            }
            Binding::Unbound => Err(SessionError::Unbound),
        }
    }

    /// Persist the in-memory context under the bound id, overwriting the
    /// stored transcript. The first save of a created session inserts its
    /// record; an id taken in the meantime fails with a conflict. The
    /// in-memory context is left unchanged.
    pub async fn save_session(&mut self) -> Result<(), SessionError> {
        let Binding::Bound {
            session_id,
            context,
            persisted,
        } = &mut self.binding
        else {
            return Err(SessionError::Unbound);
        };

        if *persisted {
            self.store
                .replace_turns(session_id, context)
                .await
                .map_err(|e| match e {
                    RepositoryError::NotFound => SessionError::NotFound(session_id.clone()),
                    other => SessionError::Persistence(other),
                })?;
        } else {
            let now = Utc::now();
            let record = SessionRecord {
                session_id: session_id.clone(),
                context: context.clone(),
                created_at: now,
                updated_at: now,
            };
            self.store.insert(&record).await?;
            *persisted = true;
        }

        debug!(session_id = %session_id, turns = context.len(), "Session saved");
        Ok(())
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        match &self.binding {
            Binding::Bound { session_id, .. } => Some(session_id),
            Binding::Unbound => None,
        }
    }

    /// The working transcript. Empty while unbound.
    pub fn context(&self) -> &[Turn] {
        match &self.binding {
            Binding::Bound { context, .. } => context,
            Binding::Unbound => &[],
        }
    }

    pub fn is_bound(&self) -> bool {
        matches!(self.binding, Binding::Bound { .. })
    }
}
