//! Arena Registry - Concurrent Session Registry
//!
//! The stateful layer of Arena. [`SessionRegistry`] turns the pure rules from
//! `arena-lobby` into safe concurrent operations over any
//! [`SessionStore`](arena_core::SessionStore):
//!
//! - per-session exclusivity through a reclaimable lock table ([`locks`])
//! - optimistic commits with bounded retry on version conflicts
//! - deadlines on every wait, via [`SessionRegistry::within`]
//!
//! [`SessionService`] adds authentication and role checks on top and is the
//! surface the calling layer talks to.
//!
//! # Example
//!
//! ```ignore
//! let registry = SessionRegistry::with_defaults(MemorySessionStore::new());
//! let session = registry.create("A", 2, None).await?;
//! registry.join(session.id, player).await?;
//! registry.within(Duration::from_millis(200)).start(session.id).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod locks;
pub mod registry;
pub mod service;

pub use locks::{SessionLease, SessionLocks};
pub use registry::{Bounded, JoinReceipt, SessionRegistry};
pub use service::{SessionRequest, SessionResponse, SessionService};
