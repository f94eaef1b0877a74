//! Per-session lock table
//!
//! One async mutex per session id, created on first use and reclaimed once no
//! lease holds it and no waiter is queued on it. The table itself sits behind
//! a short synchronous lock that is never held across an await, so sessions
//! never wait on each other.
//!
//! Every clone of a slot is taken under the table lock, and a slot is removed
//! only when the table holds the last reference. A slot that is removed
//! therefore has no holder and no waiter, and two callers can never end up
//! holding different slots for the same id.

use arena_core::SessionId;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tokio::time::error::Elapsed;
use tokio::time::Instant;

type Slot = Arc<AsyncMutex<()>>;

/// Table of per-session locks
#[derive(Debug, Default)]
pub struct SessionLocks {
    slots: Mutex<HashMap<SessionId, Slot>>,
}

impl SessionLocks {
    /// Create an empty lock table
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `id` until `deadline`.
    ///
    /// Dropping the returned lease releases the session. Dropping the
    /// acquire future itself, or timing out, reclaims the slot if nobody
    /// else is using it.
    pub async fn acquire(&self, id: SessionId, deadline: Instant) -> Result<SessionLease<'_>, Elapsed> {
        // Declared before the lock future so it runs after that future (and
        // its slot reference) is gone, including on cancellation.
        let _reclaim = ReclaimOnDrop { locks: self, id };
        let guard = tokio::time::timeout_at(deadline, self.slot(id).lock_owned()).await?;

        Ok(SessionLease {
            locks: self,
            id,
            guard: Some(guard),
        })
    }

    /// Number of sessions with a live slot
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    /// Check if no session currently has a slot
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, id: SessionId) -> Slot {
        Arc::clone(self.slots.lock().entry(id).or_default())
    }

    fn release_if_idle(&self, id: &SessionId) {
        let mut slots = self.slots.lock();
        if slots
            .get(id)
            .is_some_and(|slot| Arc::strong_count(slot) == 1)
        {
            slots.remove(id);
        }
    }
}

/// Reclaims an idle slot when an acquire attempt ends, however it ends
struct ReclaimOnDrop<'a> {
    locks: &'a SessionLocks,
    id: SessionId,
}

impl Drop for ReclaimOnDrop<'_> {
    fn drop(&mut self) {
        self.locks.release_if_idle(&self.id);
    }
}

/// Exclusive access to one session
pub struct SessionLease<'a> {
    locks: &'a SessionLocks,
    id: SessionId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl SessionLease<'_> {
    /// The session this lease covers
    pub fn session_id(&self) -> SessionId {
        self.id
    }
}

impl Drop for SessionLease<'_> {
    fn drop(&mut self) {
        // Release the mutex before checking idleness so our own reference
        // is not counted.
        drop(self.guard.take());
        self.locks.release_if_idle(&self.id);
    }
}

impl std::fmt::Debug for SessionLease<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionLease").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn far() -> Instant {
        Instant::now() + Duration::from_secs(5)
    }

    #[tokio::test]
    async fn test_slot_reclaimed_after_release() {
        let locks = SessionLocks::new();
        let id = SessionId::new();

        let lease = locks.acquire(id, far()).await.unwrap();
        assert_eq!(lease.session_id(), id);
        assert_eq!(locks.len(), 1);

        drop(lease);
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_distinct_sessions_do_not_block() {
        let locks = SessionLocks::new();
        let _a = locks.acquire(SessionId::new(), far()).await.unwrap();
        let b = locks
            .acquire(SessionId::new(), Instant::now() + Duration::from_millis(50))
            .await;
        assert!(b.is_ok());
        assert_eq!(locks.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_session_times_out_and_cleans_up() {
        let locks = SessionLocks::new();
        let id = SessionId::new();
        let held = locks.acquire(id, far()).await.unwrap();

        let waited = locks
            .acquire(id, Instant::now() + Duration::from_millis(20))
            .await;
        assert!(waited.is_err());
        // Still one slot: the holder keeps it alive
        assert_eq!(locks.len(), 1);

        drop(held);
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_waiter_gets_lock_after_release() {
        let locks = Arc::new(SessionLocks::new());
        let id = SessionId::new();
        let held = locks.acquire(id, far()).await.unwrap();

        let waiter = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let lease = locks.acquire(id, far()).await;
                lease.is_ok()
            })
        };

        tokio::task::yield_now().await;
        drop(held);
        assert!(waiter.await.unwrap());
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_waiter_reclaims_slot() {
        let locks = SessionLocks::new();
        let id = SessionId::new();
        let held = locks.acquire(id, far()).await.unwrap();

        let mut waiter = Box::pin(locks.acquire(id, far()));
        assert!(futures::poll!(waiter.as_mut()).is_pending());

        // The waiter is handed the lock, then dropped before it runs again
        drop(held);
        assert_eq!(locks.len(), 1);
        drop(waiter);
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_waiter_leaves_holder_slot() {
        let locks = SessionLocks::new();
        let id = SessionId::new();
        let held = locks.acquire(id, far()).await.unwrap();

        let mut waiter = Box::pin(locks.acquire(id, far()));
        assert!(futures::poll!(waiter.as_mut()).is_pending());
        drop(waiter);
        // Still one slot: the holder keeps it alive
        assert_eq!(locks.len(), 1);

        drop(held);
        assert!(locks.is_empty());
    }
}
