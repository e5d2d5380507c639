//! SessionStore trait definition.
//!
//! The durable key-value backend keyed by session id, storing the ordered
//! turn sequence. Uses native async fn in traits (RPITIT, Rust 2024 edition).

use parley_types::error::RepositoryError;
use parley_types::session::{SessionId, SessionRecord, Turn};

/// Repository trait for session transcripts.
///
/// Implementations live in parley-core (`InMemorySessionStore`) and
/// parley-infra (`SqliteSessionStore`).
///
/// `replace_turns` must be atomic with respect to `get`: a reader observes
/// either the previous transcript or the new one, never a partial write.
pub trait SessionStore: Send + Sync {
    /// Insert a new session record.
    ///
    /// Fails with [`RepositoryError::Conflict`] if the id is already taken.
    fn insert(
        &self,
        record: &SessionRecord,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Fetch a session record with its full transcript, in order.
    fn get(
        &self,
        session_id: &SessionId,
    ) -> impl std::future::Future<Output = Result<Option<SessionRecord>, RepositoryError>> + Send;

    /// Overwrite the stored transcript of an existing session and bump `updated_at`.
    ///
    /// Fails with [`RepositoryError::NotFound`] if the id was never inserted.
    fn replace_turns(
        &self,
        session_id: &SessionId,
        turns: &[Turn],
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Count stored sessions.
    fn count(&self) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;
}
