//! In-process session store.
//!
//! Backs the `memory` storage backend and the unit tests. Each entry holds a
//! whole `SessionRecord`; saves swap the transcript under the entry's shard
//! lock, so readers clone either the old or the new transcript.

use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use parley_types::error::RepositoryError;
use parley_types::session::{SessionId, SessionRecord, Turn};

use super::store::SessionStore;

/// Concurrent map of session id to record. Not durable across restarts.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: DashMap<SessionId, SessionRecord>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemorySessionStore {
    async fn insert(&self, record: &SessionRecord) -> Result<(), RepositoryError> {
        match self.sessions.entry(record.session_id.clone()) {
            Entry::Occupied(_) => Err(RepositoryError::Conflict(format!(
                "session '{}' already exists",
                record.session_id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
                Ok(())
            }
        }
    }

    async fn get(&self, session_id: &SessionId) -> Result<Option<SessionRecord>, RepositoryError> {
        Ok(self.sessions.get(session_id).map(|r| r.value().clone()))
    }

    async fn replace_turns(
        &self,
        session_id: &SessionId,
        turns: &[Turn],
    ) -> Result<(), RepositoryError> {
        let mut record = self
            .sessions
            .get_mut(session_id)
            .ok_or(RepositoryError::NotFound)?;
        record.context = turns.to_vec();
        record.updated_at = Utc::now();
        Ok(())
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        Ok(self.sessions.len() as u64)
    }
}
