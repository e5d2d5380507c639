//! Runtime selection of the session store.
//!
//! `SessionStore` uses RPITIT and is not object-safe, so the two concrete
//! stores are wrapped in an enum that forwards each call.

use std::path::Path;

use anyhow::Context;

use parley_core::session::memory::InMemorySessionStore;
use parley_core::session::store::SessionStore;
use parley_types::config::{StorageBackendKind, StorageConfig};
use parley_types::error::RepositoryError;
use parley_types::session::{SessionId, SessionRecord, Turn};

use crate::sqlite::pool::DatabasePool;
use crate::sqlite::session::SqliteSessionStore;

/// File name of the SQLite database inside the data directory.
pub const DEFAULT_DB_FILE: &str = "parley.db";

/// The session store chosen by `[storage].backend`.
pub enum SessionBackend {
    Sqlite(SqliteSessionStore),
    Memory(InMemorySessionStore),
}

impl SessionBackend {
    /// Open the configured backend.
    ///
    /// For SQLite the database lives at `storage.path`, or
    /// `{data_dir}/parley.db` when unset. Parent directories are created and
    /// migrations are applied before the store is returned.
    pub async fn from_config(storage: &StorageConfig, data_dir: &Path) -> anyhow::Result<Self> {
        match storage.backend {
            StorageBackendKind::Memory => {
                tracing::info!("using in-memory session store; transcripts will not survive restart");
                Ok(Self::Memory(InMemorySessionStore::new()))
            }
            StorageBackendKind::Sqlite => {
                let path = storage
                    .path
                    .clone()
                    .unwrap_or_else(|| data_dir.join(DEFAULT_DB_FILE));
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    tokio::fs::create_dir_all(parent).await.with_context(|| {
                        format!("failed to create database directory {}", parent.display())
                    })?;
                }
                let pool = DatabasePool::open(&path)
                    .await
                    .with_context(|| format!("failed to open session database {}", path.display()))?;
                tracing::info!(path = %path.display(), "opened sqlite session store");
                Ok(Self::Sqlite(SqliteSessionStore::new(pool)))
            }
        }
    }

    /// Short backend label for logs and the CLI.
    pub fn kind(&self) -> StorageBackendKind {
        match self {
            Self::Sqlite(_) => StorageBackendKind::Sqlite,
            Self::Memory(_) => StorageBackendKind::Memory,
        }
    }
}

impl SessionStore for SessionBackend {
    async fn insert(&self, record: &SessionRecord) -> Result<(), RepositoryError> {
        match self {
            Self::Sqlite(store) => store.insert(record).await,
            Self::Memory(store) => store.insert(record).await,
        }
    }

    async fn get(&self, session_id: &SessionId) -> Result<Option<SessionRecord>, RepositoryError> {
        match self {
            Self::Sqlite(store) => store.get(session_id).await,
            Self::Memory(store) => store.get(session_id).await,
        }
    }

    async fn replace_turns(
        &self,
        session_id: &SessionId,
        turns: &[Turn],
    ) -> Result<(), RepositoryError> {
        match self {
            Self::Sqlite(store) => store.replace_turns(session_id, turns).await,
            Self::Memory(store) => store.replace_turns(session_id, turns).await,
        }
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        match self {
            Self::Sqlite(store) => store.count().await,
            Self::Memory(store) => store.count().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_backend_from_config() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = StorageConfig {
            backend: StorageBackendKind::Memory,
            path: None,
        };
        let backend = SessionBackend::from_config(&storage, tmp.path()).await.unwrap();
        assert_eq!(backend.kind(), StorageBackendKind::Memory);
        assert!(!tmp.path().join(DEFAULT_DB_FILE).exists());
    }

    #[tokio::test]
    async fn test_sqlite_backend_defaults_to_data_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let data_dir = tmp.path().join("nested").join("data");
        let backend = SessionBackend::from_config(&StorageConfig::default(), &data_dir)
            .await
            .unwrap();
        assert_eq!(backend.kind(), StorageBackendKind::Sqlite);
        assert!(data_dir.join(DEFAULT_DB_FILE).exists());
    }

    #[tokio::test]
    async fn test_sqlite_backend_honors_explicit_path() {
        let tmp = tempfile::tempdir().unwrap();
        let db = tmp.path().join("elsewhere.db");
        let storage = StorageConfig {
            backend: StorageBackendKind::Sqlite,
            path: Some(db.clone()),
        };
        let backend = SessionBackend::from_config(&storage, tmp.path()).await.unwrap();

        let record = SessionRecord::empty(SessionId::generate());
        backend.insert(&record).await.unwrap();
        backend
            .replace_turns(&record.session_id, &[Turn::user("hi")])
            .await
            .unwrap();

        assert!(db.exists());
        assert_eq!(backend.count().await.unwrap(), 1);
        let found = backend.get(&record.session_id).await.unwrap().unwrap();
        assert_eq!(found.context, vec![Turn::user("hi")]);
    }
}
