//! # Arena Core - Foundation
//!
//! **Purpose**: Define the session model, the unified error type and the effect
//! interfaces every other Arena crate builds on.
//!
//! # Architecture Constraints
//!
//! - YES Session aggregate, identifiers, actor and role types
//! - YES Effect traits (`SessionStore`, `IdentityProvider`)
//! - YES Configuration types and validation
//! - NO effect handler implementations (use `arena-effects`)
//! - NO admission rules (that's `arena-lobby`)
//! - NO concurrency control (that's `arena-registry`)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Authenticated actors and roles
pub mod actor;

/// Registry and logging configuration
pub mod config;

/// Effect interfaces for storage and identity
pub mod effects;

/// Unified error types
pub mod errors;

/// Session and player identifiers
pub mod identifiers;

/// Session aggregate and lifecycle states
pub mod session;

pub use actor::{Actor, Role};
pub use config::{ArenaConfig, EndPolicy, LoggingConfig, RegistryConfig, StartPolicy};
pub use effects::{IdentityProvider, SessionMutation, SessionStore, StoreError};
pub use errors::{ArenaError, ErrorKind, Result};
pub use identifiers::{PlayerId, SessionId};
pub use session::{Score, Session, SessionState};
