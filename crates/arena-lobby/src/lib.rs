//! Arena Lobby - Session Domain Rules
//!
//! Pure, synchronous rules for game sessions:
//!
//! - [`AdmissionPolicy`]: which actions a session snapshot accepts (capacity,
//!   duplicate membership, lifecycle legality)
//! - [`RoleGuard`]: which actors may invoke which operation
//!
//! Neither touches storage or holds locks. The registry evaluates them while it
//! holds per-session exclusivity and commits only allowed actions.
//!
//! # Example
//!
//! ```
//! use arena_core::{PlayerId, Session, SessionId};
//! use arena_lobby::{Action, AdmissionPolicy};
//!
//! let session = Session::new(SessionId::new(), "A", 2, None).unwrap();
//! let decision = AdmissionPolicy::default().evaluate(&session, &Action::Join(PlayerId::new()));
//! assert!(decision.is_allowed());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod admission;
pub mod guard;

pub use admission::{Action, AdmissionDecision, AdmissionPolicy, DenyReason};
pub use guard::{Operation, RoleGuard, DEFAULT_REQUIREMENTS};
