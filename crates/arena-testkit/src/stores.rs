//! Fault-injecting session stores
//!
//! Wrappers around any [`SessionStore`] that misbehave on demand:
//!
//! - [`FaultyStore`] injects version conflicts, outages and writes from a
//!   foreign writer that the registry's lock table cannot see
//! - [`SlowStore`] adds latency to reads and writes
//!
//! Both honour the store contract: an error means nothing was written.

use arena_core::{
    PlayerId, Session, SessionId, SessionMutation, SessionState, SessionStore, StoreError,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// What happens to the next commit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitFault {
    /// Reject with `VersionConflict` without writing
    Conflict,
    /// Reject with `Unavailable` without writing
    Outage,
    /// Another writer adds `PlayerId` to the session first, so the commit
    /// meets a genuinely newer version
    ForeignJoin(PlayerId),
}

/// Store wrapper that fails on demand
#[derive(Debug, Default)]
pub struct FaultyStore<S> {
    inner: S,
    call_outages: AtomicU32,
    commit_faults: Mutex<VecDeque<CommitFault>>,
    commit_attempts: AtomicU32,
}

impl<S: SessionStore> FaultyStore<S> {
    /// Wrap `inner` with no faults queued
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            call_outages: AtomicU32::new(0),
            commit_faults: Mutex::new(VecDeque::new()),
            commit_attempts: AtomicU32::new(0),
        }
    }

    /// The wrapped store
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Fail the next `count` get, create and list calls with `Unavailable`
    pub fn fail_next_calls(&self, count: u32) {
        self.call_outages.fetch_add(count, Ordering::SeqCst);
    }

    /// Queue `fault` for the next `count` commits
    pub fn push_commit_faults(&self, fault: CommitFault, count: usize) {
        self.commit_faults
            .lock()
            .extend(std::iter::repeat(fault).take(count));
    }

    /// Conditional updates attempted so far, faulted or not
    pub fn commit_attempts(&self) -> u32 {
        self.commit_attempts.load(Ordering::SeqCst)
    }

    fn take_call_outage(&self) -> Option<StoreError> {
        self.call_outages
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .ok()
            .map(|_| StoreError::unavailable("injected outage"))
    }
}

#[async_trait]
impl<S: SessionStore> SessionStore for FaultyStore<S> {
    async fn get(&self, id: &SessionId) -> Result<Session, StoreError> {
        if let Some(err) = self.take_call_outage() {
            return Err(err);
        }
        self.inner.get(id).await
    }

    async fn create(&self, session: Session) -> Result<Session, StoreError> {
        if let Some(err) = self.take_call_outage() {
            return Err(err);
        }
        self.inner.create(session).await
    }

    async fn conditional_update(
        &self,
        id: &SessionId,
        expected_version: u64,
        mutation: SessionMutation,
    ) -> Result<Session, StoreError> {
        self.commit_attempts.fetch_add(1, Ordering::SeqCst);
        let fault = self.commit_faults.lock().pop_front();

        match fault {
            None => {}
            Some(CommitFault::Conflict) => {
                return Err(StoreError::VersionConflict {
                    session_id: *id,
                    expected: expected_version,
                    current: expected_version + 1,
                })
            }
            Some(CommitFault::Outage) => {
                return Err(StoreError::unavailable("injected commit outage"))
            }
            Some(CommitFault::ForeignJoin(player)) => {
                let current = self.inner.get(id).await?;
                self.inner
                    .conditional_update(
                        id,
                        current.version,
                        Box::new(move |session: &mut Session| session.players.push(player)),
                    )
                    .await?;
            }
        }

        self.inner
            .conditional_update(id, expected_version, mutation)
            .await
    }

    async fn list_by_state(&self, state: SessionState) -> Result<Vec<Session>, StoreError> {
        if let Some(err) = self.take_call_outage() {
            return Err(err);
        }
        self.inner.list_by_state(state).await
    }
}

/// Store wrapper adding fixed latency
#[derive(Debug, Default)]
pub struct SlowStore<S> {
    inner: S,
    read_delay: Duration,
    commit_delay: Duration,
}

impl<S: SessionStore> SlowStore<S> {
    /// Wrap `inner`, delaying reads by `read_delay` and writes by
    /// `commit_delay`. A create is stored before its delay starts.
    pub fn new(inner: S, read_delay: Duration, commit_delay: Duration) -> Self {
        Self {
            inner,
            read_delay,
            commit_delay,
        }
    }

    /// The wrapped store
    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: SessionStore> SessionStore for SlowStore<S> {
    async fn get(&self, id: &SessionId) -> Result<Session, StoreError> {
        tokio::time::sleep(self.read_delay).await;
        self.inner.get(id).await
    }

    async fn create(&self, session: Session) -> Result<Session, StoreError> {
        // The insert lands first; only the acknowledgement is slow
        let created = self.inner.create(session).await?;
        tokio::time::sleep(self.commit_delay).await;
        Ok(created)
    }

    async fn conditional_update(
        &self,
        id: &SessionId,
        expected_version: u64,
        mutation: SessionMutation,
    ) -> Result<Session, StoreError> {
        tokio::time::sleep(self.commit_delay).await;
        self.inner
            .conditional_update(id, expected_version, mutation)
            .await
    }

    async fn list_by_state(&self, state: SessionState) -> Result<Vec<Session>, StoreError> {
        tokio::time::sleep(self.read_delay).await;
        self.inner.list_by_state(state).await
    }
}
