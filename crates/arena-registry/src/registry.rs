//! Session registry
//!
//! Owns the session store, the admission policy and the per-session lock
//! table. Every mutating operation follows the same path:
//!
//! 1. acquire the session's lease (bounded by the operation deadline)
//! 2. read the latest snapshot
//! 3. evaluate the admission policy against it
//! 4. commit conditioned on the snapshot's version
//! 5. on a version conflict, back off and go to 2
//!
//! The lease serializes callers inside this process; the conditional update
//! protects against writers the lease cannot see. Deadlines bound the waiting
//! phases only. A write (a commit or the insert behind `create`) is only issued
//! before the deadline and is never abandoned midway, so a `Timeout` always
//! means nothing was written.

use crate::locks::SessionLocks;
use arena_core::{
    ArenaError, PlayerId, RegistryConfig, Result, Score, Session, SessionId, SessionState,
    SessionStore, StoreError,
};
use arena_lobby::{Action, AdmissionPolicy};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Stand-in deadline for callers that ask for no bound
const UNBOUNDED: Duration = Duration::from_secs(60 * 60 * 24 * 365 * 30);

/// How a store call relates to the operation deadline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StoreCall {
    /// Reads are abandoned when the deadline passes
    Read,
    /// Writes only start before the deadline and always run to completion
    Write,
}

/// Confirmation returned by a successful join
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinReceipt {
    /// Session joined
    pub session_id: SessionId,
    /// Player admitted
    pub player: PlayerId,
    /// Members after the join
    pub player_count: usize,
    /// Capacity of the session
    pub max_players: u32,
}

impl JoinReceipt {
    fn from_session(session: &Session, player: PlayerId) -> Self {
        Self {
            session_id: session.id,
            player,
            player_count: session.player_count(),
            max_players: session.max_players,
        }
    }
}

/// Concurrent session registry
#[derive(Debug)]
pub struct SessionRegistry<S> {
    store: S,
    policy: AdmissionPolicy,
    config: RegistryConfig,
    locks: SessionLocks,
}

impl<S: SessionStore> SessionRegistry<S> {
    /// Create a registry over `store`
    pub fn new(store: S, config: RegistryConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            policy: AdmissionPolicy::from_config(&config),
            config,
            locks: SessionLocks::new(),
        })
    }

    /// Create a registry with default configuration
    pub fn with_defaults(store: S) -> Self {
        let config = RegistryConfig::default();
        Self {
            store,
            policy: AdmissionPolicy::from_config(&config),
            config,
            locks: SessionLocks::new(),
        }
    }

    /// Active configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Active admission policy
    pub fn policy(&self) -> AdmissionPolicy {
        self.policy
    }

    /// Underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Sessions that currently have a live lock slot
    pub fn active_locks(&self) -> usize {
        self.locks.len()
    }

    /// Scope the next operation to finish waiting within `timeout`.
    ///
    /// A timeout too large to represent means no bound.
    pub fn within(&self, timeout: Duration) -> Bounded<'_, S> {
        let now = Instant::now();
        Bounded {
            registry: self,
            deadline: now.checked_add(timeout).unwrap_or_else(|| now + UNBOUNDED),
        }
    }

    fn bounded(&self) -> Bounded<'_, S> {
        self.within(self.config.operation_timeout())
    }

    /// Create a session in `waiting`, optionally seeded with one player
    pub async fn create(
        &self,
        name: &str,
        max_players: u32,
        initial_player: Option<PlayerId>,
    ) -> Result<Session> {
        self.bounded().create(name, max_players, initial_player).await
    }

    /// Admit `player` into the session
    pub async fn join(&self, id: SessionId, player: PlayerId) -> Result<JoinReceipt> {
        self.bounded().join(id, player).await
    }

    /// Move the session to `in_progress`
    pub async fn start(&self, id: SessionId) -> Result<Session> {
        self.bounded().start(id).await
    }

    /// Record the score and move the session to `finished`
    pub async fn end(&self, id: SessionId, score: Score) -> Result<Session> {
        self.bounded().end(id, score).await
    }

    /// List sessions whose state matches `filter`
    pub async fn list(&self, filter: &str) -> Result<Vec<Session>> {
        self.bounded().list(filter).await
    }

    /// Read one session
    pub async fn get(&self, id: SessionId) -> Result<Session> {
        self.bounded().get(id).await
    }
}

/// Registry operations sharing one deadline
#[derive(Debug)]
pub struct Bounded<'a, S> {
    registry: &'a SessionRegistry<S>,
    deadline: Instant,
}

impl<S: SessionStore> Bounded<'_, S> {
    /// Time left before the deadline
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// See [`SessionRegistry::create`]
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn create(
        &self,
        name: &str,
        max_players: u32,
        initial_player: Option<PlayerId>,
    ) -> Result<Session> {
        let max_capacity = self.registry.config.max_capacity;
        if max_players > max_capacity {
            return Err(ArenaError::invalid(format!(
                "max_players must not exceed {max_capacity}, got {max_players}"
            )));
        }

        let session = Session::new(SessionId::new(), name, max_players, initial_player)?;
        let store = &self.registry.store;
        let created = self
            .with_store_retries("create", StoreCall::Write, move || {
                store.create(session.clone())
            })
            .await?;

        info!(
            session_id = %created.id,
            name = %created.name,
            max_players = created.max_players,
            "session created"
        );
        Ok(created)
    }

    /// See [`SessionRegistry::join`]
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn join(&self, id: SessionId, player: PlayerId) -> Result<JoinReceipt> {
        let session = self.mutate(id, Action::Join(player)).await?;
        Ok(JoinReceipt::from_session(&session, player))
    }

    /// See [`SessionRegistry::start`]
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn start(&self, id: SessionId) -> Result<Session> {
        self.mutate(id, Action::Start).await
    }

    /// See [`SessionRegistry::end`]
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn end(&self, id: SessionId, score: Score) -> Result<Session> {
        self.mutate(id, Action::End(score)).await
    }

    /// See [`SessionRegistry::list`]
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn list(&self, filter: &str) -> Result<Vec<Session>> {
        let state: SessionState = filter.parse()?;
        let store = &self.registry.store;
        self.with_store_retries("list", StoreCall::Read, move || {
            store.list_by_state(state)
        })
            .await
    }

    /// See [`SessionRegistry::get`]
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn get(&self, id: SessionId) -> Result<Session> {
        self.read(id, "get").await
    }

    async fn read(&self, id: SessionId, operation: &'static str) -> Result<Session> {
        let store = &self.registry.store;
        let id_ref = &id;
        self.with_store_retries(operation, StoreCall::Read, move || store.get(id_ref))
            .await
    }

    async fn mutate(&self, id: SessionId, action: Action) -> Result<Session> {
        let operation = action.name();
        let _lease = self
            .registry
            .locks
            .acquire(id, self.deadline)
            .await
            .map_err(|_| {
                warn!(session_id = %id, operation, "timed out waiting for session lock");
                ArenaError::timeout(operation)
            })?;

        let max_attempts = self.registry.config.max_commit_attempts;
        let mut attempt = 0;
        loop {
            attempt += 1;

            let snapshot = self.read(id, operation).await?;
            self.registry
                .policy
                .evaluate(&snapshot, &action)
                .into_result(&snapshot)?;

            if !action.changes(&snapshot) {
                debug!(session_id = %id, operation, state = %snapshot.state, "nothing to change");
                return Ok(snapshot);
            }

            let outcome = self
                .registry
                .store
                .conditional_update(
                    &id,
                    snapshot.version,
                    Box::new(move |session: &mut Session| action.apply_to(session)),
                )
                .await;

            match outcome {
                Ok(committed) => {
                    debug_assert!(snapshot.check_successor(&committed).is_ok());
                    info!(
                        session_id = %id,
                        operation,
                        state = %committed.state,
                        players = committed.player_count(),
                        version = committed.version,
                        attempt,
                        "session updated"
                    );
                    return Ok(committed);
                }
                Err(err) if err.is_transient() && attempt < max_attempts => {
                    warn!(session_id = %id, operation, attempt, error = %err, "commit failed, retrying");
                    let Some(backoff) = self.backoff(attempt) else {
                        return Err(surface(err, operation, attempt));
                    };
                    tokio::time::sleep(backoff).await;
                }
                Err(err) => return Err(surface(err, operation, attempt)),
            }
        }
    }

    /// Run a store call, retrying outages within the attempt budget.
    ///
    /// A [`StoreCall::Write`] is checked against the deadline before it is
    /// issued and then awaited to completion, like a commit.
    async fn with_store_retries<T, F, Fut>(
        &self,
        operation: &'static str,
        kind: StoreCall,
        mut call: F,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, StoreError>>,
    {
        let max_attempts = self.registry.config.max_commit_attempts;
        let mut attempt = 0;
        loop {
            attempt += 1;

            let outcome = match kind {
                StoreCall::Read => tokio::time::timeout_at(self.deadline, call())
                    .await
                    .map_err(|_| {
                        warn!(operation, "timed out waiting for session store");
                        ArenaError::timeout(operation)
                    })?,
                StoreCall::Write => {
                    if Instant::now() >= self.deadline {
                        warn!(operation, "deadline passed before store write");
                        return Err(ArenaError::timeout(operation));
                    }
                    call().await
                }
            };

            match outcome {
                Ok(value) => return Ok(value),
                Err(err @ StoreError::Unavailable { .. }) if attempt < max_attempts => {
                    warn!(operation, attempt, error = %err, "store unavailable, retrying");
                    let Some(backoff) = self.backoff(attempt) else {
                        return Err(surface(err, operation, attempt));
                    };
                    tokio::time::sleep(backoff).await;
                }
                Err(err) => return Err(surface(err, operation, attempt)),
            }
        }
    }

    /// Backoff before retry `attempt + 1`, or `None` if it would overrun the deadline.
    fn backoff(&self, attempt: u32) -> Option<Duration> {
        let backoff = self.registry.config.retry_backoff().checked_mul(attempt)?;
        let resume = Instant::now().checked_add(backoff)?;
        (resume < self.deadline).then_some(backoff)
    }
}

fn surface(err: StoreError, operation: &'static str, attempts: u32) -> ArenaError {
    match err {
        StoreError::NotFound(id) => ArenaError::not_found(id),
        StoreError::Duplicate(id) => ArenaError::invalid(format!("session {id} already exists")),
        StoreError::VersionConflict { session_id, .. } => {
            warn!(session_id = %session_id, operation, attempts, "giving up after repeated conflicts");
            ArenaError::Conflict {
                session_id,
                attempts,
            }
        }
        StoreError::Unavailable { reason } => {
            error!(operation, attempts, reason = %reason, "session store unavailable");
            ArenaError::StoreUnavailable
        }
    }
}
