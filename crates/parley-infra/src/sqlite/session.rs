//! SQLite session store implementation.
//!
//! Implements `SessionStore` from `parley-core` using sqlx with split read/write pools.
//! A session is a header row in `sessions` plus one row per turn in
//! `session_turns`, keyed by `(session_id, position)`. Saves rewrite the turn
//! rows inside one write transaction; loads read header and turns inside one
//! read transaction, so a WAL reader always sees a whole transcript.

use chrono::{DateTime, Utc};
use sqlx::Row;

use parley_core::session::store::SessionStore;
use parley_types::error::RepositoryError;
use parley_types::session::{Role, SessionId, SessionRecord, Turn};

use super::pool::DatabasePool;

/// SQLite-backed implementation of `SessionStore`.
#[derive(Clone)]
pub struct SqliteSessionStore {
    pool: DatabasePool,
}

impl SqliteSessionStore {
    /// Create a new store backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct SessionRow {
    id: String,
    created_at: String,
    updated_at: String,
}

impl SessionRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_record(self, context: Vec<Turn>) -> Result<SessionRecord, RepositoryError> {
        Ok(SessionRecord {
            session_id: SessionId::from(self.id),
            context,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

struct TurnRow {
    role: String,
    content: String,
}

impl TurnRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            role: row.try_get("role")?,
            content: row.try_get("content")?,
        })
    }

    fn into_turn(self) -> Result<Turn, RepositoryError> {
        let role: Role = self
            .role
            .parse()
            .map_err(RepositoryError::Query)?;
        Ok(Turn {
            role,
            content: self.content,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn query_err(e: sqlx::Error) -> RepositoryError {
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            RepositoryError::Connection
        }
        other => RepositoryError::Query(other.to_string()),
    }
}

async fn insert_turns(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    session_id: &SessionId,
    turns: &[Turn],
) -> Result<(), RepositoryError> {
    for (position, turn) in turns.iter().enumerate() {
        sqlx::query(
            "INSERT INTO session_turns (session_id, position, role, content) VALUES (?, ?, ?, ?)",
        )
        .bind(session_id.as_str())
        .bind(position as i64)
        .bind(turn.role.to_string())
        .bind(&turn.content)
        .execute(&mut **tx)
        .await
        .map_err(query_err)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// SessionStore implementation
// ---------------------------------------------------------------------------

impl SessionStore for SqliteSessionStore {
    async fn insert(&self, record: &SessionRecord) -> Result<(), RepositoryError> {
        let mut tx = self.pool.writer.begin().await.map_err(query_err)?;

        sqlx::query(
            "INSERT INTO sessions (id, turn_count, created_at, updated_at) VALUES (?, ?, ?, ?)",
        )
        .bind(record.session_id.as_str())
        .bind(record.context.len() as i64)
        .bind(format_datetime(&record.created_at))
        .bind(format_datetime(&record.updated_at))
        .execute(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                RepositoryError::Conflict(format!("session '{}' already exists", record.session_id))
            }
            other => query_err(other),
        })?;

        insert_turns(&mut tx, &record.session_id, &record.context).await?;

        tx.commit().await.map_err(query_err)?;
        Ok(())
    }

    async fn get(&self, session_id: &SessionId) -> Result<Option<SessionRecord>, RepositoryError> {
        let mut tx = self.pool.reader.begin().await.map_err(query_err)?;

        let row = sqlx::query("SELECT id, created_at, updated_at FROM sessions WHERE id = ?")
            .bind(session_id.as_str())
            .fetch_optional(&mut *tx)
            .await
            .map_err(query_err)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let session_row = SessionRow::from_row(&row).map_err(query_err)?;

        let turn_rows = sqlx::query(
            "SELECT role, content FROM session_turns WHERE session_id = ? ORDER BY position ASC",
        )
        .bind(session_id.as_str())
        .fetch_all(&mut *tx)
        .await
        .map_err(query_err)?;

        tx.commit().await.map_err(query_err)?;

        let mut context = Vec::with_capacity(turn_rows.len());
        for row in &turn_rows {
            let turn_row = TurnRow::from_row(row).map_err(query_err)?;
            context.push(turn_row.into_turn()?);
        }

        Ok(Some(session_row.into_record(context)?))
    }

    async fn replace_turns(
        &self,
        session_id: &SessionId,
        turns: &[Turn],
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.writer.begin().await.map_err(query_err)?;

        let result = sqlx::query("UPDATE sessions SET turn_count = ?, updated_at = ? WHERE id = ?")
            .bind(turns.len() as i64)
            .bind(format_datetime(&Utc::now()))
            .bind(session_id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(query_err)?;

        if result.rows_affected() == 0 {
            // Dropping the transaction rolls it back.
            return Err(RepositoryError::NotFound);
        }

        sqlx::query("DELETE FROM session_turns WHERE session_id = ?")
            .bind(session_id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(query_err)?;

        insert_turns(&mut tx, session_id, turns).await?;

        tx.commit().await.map_err(query_err)?;
        Ok(())
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        let row = sqlx::query("SELECT COUNT(*) as cnt FROM sessions")
            .fetch_one(&self.pool.reader)
            .await
            .map_err(query_err)?;

        let count: i64 = row.try_get("cnt").map_err(query_err)?;
        Ok(count as u64)
    }
}
