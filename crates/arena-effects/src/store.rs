//! In-memory session store
//!
//! Reference implementation of [`SessionStore`]. A single `RwLock` guards the
//! table; every write, including the version check and the mutation, runs
//! under the write guard with no await point in between, so readers only ever
//! see whole snapshots.

use arena_core::{Session, SessionId, SessionMutation, SessionState, SessionStore, StoreError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, trace};

#[derive(Debug, Default)]
struct Table {
    sessions: HashMap<SessionId, Session>,
    /// Creation order, used for stable listings
    order: Vec<SessionId>,
}

/// In-memory, versioned session storage
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    table: Arc<RwLock<Table>>,
}

impl MemorySessionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions
    pub async fn len(&self) -> usize {
        self.table.read().await.sessions.len()
    }

    /// Check if the store holds no sessions
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, id: &SessionId) -> Result<Session, StoreError> {
        let table = self.table.read().await;
        table
            .sessions
            .get(id)
            .cloned()
            .ok_or(StoreError::NotFound(*id))
    }

    async fn create(&self, session: Session) -> Result<Session, StoreError> {
        let mut table = self.table.write().await;
        if table.sessions.contains_key(&session.id) {
            return Err(StoreError::Duplicate(session.id));
        }

        let id = session.id;
        table.order.push(id);
        table.sessions.insert(id, session.clone());
        debug!(session_id = %id, "stored new session");
        Ok(session)
    }

    async fn conditional_update(
        &self,
        id: &SessionId,
        expected_version: u64,
        mutation: SessionMutation,
    ) -> Result<Session, StoreError> {
        let mut table = self.table.write().await;
        let current = table.sessions.get_mut(id).ok_or(StoreError::NotFound(*id))?;

        if current.version != expected_version {
            return Err(StoreError::VersionConflict {
                session_id: *id,
                expected: expected_version,
                current: current.version,
            });
        }

        let mut next = current.clone();
        mutation(&mut next);
        next.id = *id;
        next.version = expected_version + 1;
        *current = next.clone();

        trace!(session_id = %id, version = next.version, "committed session update");
        Ok(next)
    }

    async fn list_by_state(&self, state: SessionState) -> Result<Vec<Session>, StoreError> {
        let table = self.table.read().await;
        Ok(table
            .order
            .iter()
            .filter_map(|id| table.sessions.get(id))
            .filter(|session| session.state == state)
            .cloned()
            .collect())
    }
}
