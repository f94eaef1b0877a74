//! Unified error system for Arena
//!
//! A single error type shared by every layer. Domain-rule violations are
//! reported as-is; storage failures are collapsed into
//! [`ArenaError::StoreUnavailable`] so no backend detail reaches callers.

use crate::identifiers::{PlayerId, SessionId};
use crate::session::SessionState;
use serde::{Deserialize, Serialize};

/// Unified error type for all Arena operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum ArenaError {
    /// Malformed input (bad capacity, blank name, bad filter value)
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// What was wrong with the input
        message: String,
    },

    /// The referenced session does not exist
    #[error("Session {session_id} not found")]
    NotFound {
        /// The missing session
        session_id: SessionId,
    },

    /// Join attempted on a session that no longer admits players
    #[error("Session {session_id} is not joinable (state: {state})")]
    NotJoinable {
        /// Target session
        session_id: SessionId,
        /// State observed when the join was evaluated
        state: SessionState,
    },

    /// The player is already a member of the session
    #[error("Player {player} is already in session {session_id}")]
    AlreadyMember {
        /// Target session
        session_id: SessionId,
        /// The duplicate player
        player: PlayerId,
    },

    /// The session has no free slot left
    #[error("Session {session_id} is full (max {max_players} players)")]
    SessionFull {
        /// Target session
        session_id: SessionId,
        /// Configured capacity
        max_players: u32,
    },

    /// The requested state transition is not legal from the current state
    #[error("Session {session_id} cannot move from {from} to {to}")]
    InvalidTransition {
        /// Target session
        session_id: SessionId,
        /// Current state
        from: SessionState,
        /// Requested state
        to: SessionState,
    },

    /// Concurrent writers kept invalidating the snapshot
    #[error("Session {session_id} is busy: commit conflicted {attempts} times")]
    Conflict {
        /// Contended session
        session_id: SessionId,
        /// Attempts made before giving up
        attempts: u32,
    },

    /// The operation did not finish before its deadline; nothing was written
    #[error("Operation {operation} timed out")]
    Timeout {
        /// Operation name
        operation: String,
    },

    /// Generic storage failure
    #[error("Something went wrong, check server logs")]
    StoreUnavailable,

    /// The actor lacks a role required by the operation
    #[error("Actor {actor} does not have permission to {operation}")]
    Forbidden {
        /// The rejected actor
        actor: PlayerId,
        /// Operation name
        operation: String,
    },

    /// No authenticated actor was supplied
    #[error("No authenticated actor")]
    Unauthenticated,
}

/// Flat classification of [`ArenaError`] for calling layers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Caller supplied malformed input
    InvalidArgument,
    /// Referenced session does not exist
    NotFound,
    /// Session is not in a joinable state
    NotJoinable,
    /// Duplicate membership
    AlreadyMember,
    /// Capacity reached
    SessionFull,
    /// Illegal state transition
    InvalidTransition,
    /// Write contention exhausted the retry budget
    Conflict,
    /// Deadline expired
    Timeout,
    /// Storage failure
    StoreUnavailable,
    /// Missing role
    Forbidden,
    /// Missing identity
    Unauthenticated,
}

impl ArenaError {
    /// Create an invalid argument error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(session_id: SessionId) -> Self {
        Self::NotFound { session_id }
    }

    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>) -> Self {
        Self::Timeout {
            operation: operation.into(),
        }
    }

    /// Create a forbidden error
    pub fn forbidden(actor: PlayerId, operation: impl Into<String>) -> Self {
        Self::Forbidden {
            actor,
            operation: operation.into(),
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::NotJoinable { .. } => ErrorKind::NotJoinable,
            Self::AlreadyMember { .. } => ErrorKind::AlreadyMember,
            Self::SessionFull { .. } => ErrorKind::SessionFull,
            Self::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::StoreUnavailable => ErrorKind::StoreUnavailable,
            Self::Forbidden { .. } => ErrorKind::Forbidden,
            Self::Unauthenticated => ErrorKind::Unauthenticated,
        }
    }

    /// Whether a caller may reasonably retry the same request unchanged
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict { .. } | Self::Timeout { .. })
    }

    /// Whether this error is a domain-rule violation rather than an
    /// infrastructure or input problem
    pub fn is_rule_violation(&self) -> bool {
        matches!(
            self,
            Self::NotJoinable { .. }
                | Self::AlreadyMember { .. }
                | Self::SessionFull { .. }
                | Self::InvalidTransition { .. }
        )
    }
}

/// Standard Result type for Arena operations
pub type Result<T> = std::result::Result<T, ArenaError>;
