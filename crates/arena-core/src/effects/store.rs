//! Session storage effects
//!
//! The store is the durable owner of session records. It never arbitrates
//! between concurrent writers on its own: every update names the version it
//! was computed from, and the store refuses the write if that version is no
//! longer current.
//!
//! Contract for implementations:
//! - `conditional_update` is atomic. Either the mutation is applied and the
//!   version bumped, or nothing changes.
//! - Every error return, including [`StoreError::Unavailable`], means nothing
//!   was written.
//! - Reads return complete snapshots, never a partially applied update.

use crate::identifiers::SessionId;
use crate::session::{Session, SessionState};
use async_trait::async_trait;

/// Mutation applied by the store to the current record under a version check
pub type SessionMutation = Box<dyn FnOnce(&mut Session) + Send>;

/// Storage-layer errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// No record exists for the id
    #[error("session {0} not found")]
    NotFound(SessionId),

    /// A record with the same id already exists
    #[error("session {0} already exists")]
    Duplicate(SessionId),

    /// The record changed since the caller read it
    #[error("version conflict on {session_id}: expected {expected}, current {current}")]
    VersionConflict {
        /// Target session
        session_id: SessionId,
        /// Version the caller read
        expected: u64,
        /// Version actually stored
        current: u64,
    },

    /// Backend failure; nothing was written
    #[error("storage backend unavailable: {reason}")]
    Unavailable {
        /// Backend-specific detail, for logs only
        reason: String,
    },
}

impl StoreError {
    /// Create an unavailable error
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// Whether retrying the same call can succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::VersionConflict { .. } | Self::Unavailable { .. })
    }
}

/// Durable keyed storage for sessions
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Read one session snapshot
    async fn get(&self, id: &SessionId) -> Result<Session, StoreError>;

    /// Insert a new session; fails with [`StoreError::Duplicate`] if the id exists
    async fn create(&self, session: Session) -> Result<Session, StoreError>;

    /// Apply `mutation` to the stored record if its version equals
    /// `expected_version`, bumping the version. Returns the new snapshot.
    async fn conditional_update(
        &self,
        id: &SessionId,
        expected_version: u64,
        mutation: SessionMutation,
    ) -> Result<Session, StoreError>;

    /// All sessions currently in `state`
    async fn list_by_state(&self, state: SessionState) -> Result<Vec<Session>, StoreError>;
}

#[async_trait]
impl<S: SessionStore + ?Sized> SessionStore for std::sync::Arc<S> {
    async fn get(&self, id: &SessionId) -> Result<Session, StoreError> {
        (**self).get(id).await
    }

    async fn create(&self, session: Session) -> Result<Session, StoreError> {
        (**self).create(session).await
    }

    async fn conditional_update(
        &self,
        id: &SessionId,
        expected_version: u64,
        mutation: SessionMutation,
    ) -> Result<Session, StoreError> {
        (**self)
            .conditional_update(id, expected_version, mutation)
            .await
    }

    async fn list_by_state(&self, state: SessionState) -> Result<Vec<Session>, StoreError> {
        (**self).list_by_state(state).await
    }
}
