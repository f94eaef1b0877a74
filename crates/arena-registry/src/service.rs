//! Session service
//!
//! Entry point for the calling layer. Resolves the caller through an
//! [`IdentityProvider`], checks the [`RoleGuard`], then dispatches the request
//! to the registry. Successful responses carry a human-readable message along
//! with their payload.

use crate::registry::{Bounded, JoinReceipt, SessionRegistry};
use arena_core::{
    Actor, IdentityProvider, Result, Score, Session, SessionId, SessionState, SessionStore,
};
use arena_lobby::{Operation, RoleGuard};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// A request from the calling layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SessionRequest {
    /// Create a session
    Create {
        /// Display name
        name: String,
        /// Capacity
        #[serde(rename = "maxPlayers")]
        max_players: u32,
        /// Seed the caller as the first player
        #[serde(default, rename = "joinAsFirstPlayer")]
        join_as_first_player: bool,
    },
    /// Join the caller into a session
    Join {
        /// Target session
        #[serde(rename = "sessionId")]
        session_id: SessionId,
    },
    /// Start a session
    Start {
        /// Target session
        #[serde(rename = "sessionId")]
        session_id: SessionId,
    },
    /// End a session with a final score
    End {
        /// Target session
        #[serde(rename = "sessionId")]
        session_id: SessionId,
        /// Final score
        score: Score,
    },
    /// List sessions by state; `waiting` when omitted
    List {
        /// State filter
        #[serde(default)]
        state: Option<String>,
    },
    /// Read one session
    Get {
        /// Target session
        #[serde(rename = "sessionId")]
        session_id: SessionId,
    },
}

impl SessionRequest {
    /// Operation checked by the role guard
    pub fn operation(&self) -> Operation {
        match self {
            Self::Create { .. } => Operation::CreateSession,
            Self::Join { .. } => Operation::JoinSession,
            Self::Start { .. } => Operation::StartSession,
            Self::End { .. } => Operation::EndSession,
            Self::List { .. } => Operation::ListSessions,
            Self::Get { .. } => Operation::GetSession,
        }
    }
}

/// Result of a successful request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionResponse {
    /// Session created
    Created {
        /// The new session
        session: Session,
    },
    /// Caller admitted
    Joined {
        /// Join confirmation
        receipt: JoinReceipt,
    },
    /// Session started (or already running)
    Started {
        /// Current snapshot
        session: Session,
    },
    /// Session finished
    Ended {
        /// Final snapshot
        session: Session,
    },
    /// Sessions matching the filter
    Listed {
        /// Matching sessions in creation order
        sessions: Vec<Session>,
    },
    /// Single session
    Found {
        /// The session
        session: Session,
    },
}

impl SessionResponse {
    /// Message for display to the caller
    pub fn message(&self) -> &'static str {
        match self {
            Self::Created { .. } => "Session created successfully",
            Self::Joined { .. } => "Player joined the session successfully",
            Self::Started { .. } => "Session started successfully",
            Self::Ended { .. } => "Session ended successfully",
            Self::Listed { .. } => "Sessions retrieved successfully",
            Self::Found { .. } => "Session retrieved successfully",
        }
    }
}

/// Authorized front door to a [`SessionRegistry`]
#[derive(Debug)]
pub struct SessionService<S> {
    registry: Arc<SessionRegistry<S>>,
    guard: RoleGuard,
}

impl<S> Clone for SessionService<S> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            guard: self.guard.clone(),
        }
    }
}

impl<S: SessionStore> SessionService<S> {
    /// Create a service with the default role requirements
    pub fn new(registry: Arc<SessionRegistry<S>>) -> Self {
        Self::with_guard(registry, RoleGuard::default())
    }

    /// Create a service with a custom guard
    pub fn with_guard(registry: Arc<SessionRegistry<S>>, guard: RoleGuard) -> Self {
        Self { registry, guard }
    }

    /// Shared registry
    pub fn registry(&self) -> &Arc<SessionRegistry<S>> {
        &self.registry
    }

    /// Active guard
    pub fn guard(&self) -> &RoleGuard {
        &self.guard
    }

    /// Handle a request with the configured operation deadline
    pub async fn handle(
        &self,
        identity: &dyn IdentityProvider,
        request: SessionRequest,
    ) -> Result<SessionResponse> {
        let timeout = self.registry.config().operation_timeout();
        self.handle_within(identity, request, timeout).await
    }

    /// Handle a request, giving up waiting after `timeout`
    pub async fn handle_within(
        &self,
        identity: &dyn IdentityProvider,
        request: SessionRequest,
        timeout: Duration,
    ) -> Result<SessionResponse> {
        let actor = identity.current_actor()?;
        let operation = request.operation();
        self.guard.check(&actor, operation)?;

        tracing::debug!(actor = %actor.id, operation = %operation, "dispatching request");
        let bounded = self.registry.within(timeout);
        let outcome = dispatch(&bounded, &actor, request).await;

        if let Err(err) = &outcome {
            tracing::info!(
                actor = %actor.id,
                operation = %operation,
                kind = ?err.kind(),
                error = %err,
                "request failed"
            );
        }
        outcome
    }
}

async fn dispatch<S: SessionStore>(
    registry: &Bounded<'_, S>,
    actor: &Actor,
    request: SessionRequest,
) -> Result<SessionResponse> {
    let response = match request {
        SessionRequest::Create {
            name,
            max_players,
            join_as_first_player,
        } => {
            let seed = join_as_first_player.then_some(actor.id);
            SessionResponse::Created {
                session: registry.create(&name, max_players, seed).await?,
            }
        }
        SessionRequest::Join { session_id } => SessionResponse::Joined {
            receipt: registry.join(session_id, actor.id).await?,
        },
        SessionRequest::Start { session_id } => SessionResponse::Started {
            session: registry.start(session_id).await?,
        },
        SessionRequest::End { session_id, score } => SessionResponse::Ended {
            session: registry.end(session_id, score).await?,
        },
        SessionRequest::List { state } => {
            let filter = state.as_deref().unwrap_or(SessionState::Waiting.as_str());
            SessionResponse::Listed {
                sessions: registry.list(filter).await?,
            }
        }
        SessionRequest::Get { session_id } => SessionResponse::Found {
            session: registry.get(session_id).await?,
        },
    };
    Ok(response)
}
