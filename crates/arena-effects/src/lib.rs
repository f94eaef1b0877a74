//! # Arena Effects - Handlers
//!
//! Implementations of the effect traits declared in `arena-core`:
//!
//! - [`MemorySessionStore`]: versioned in-memory [`SessionStore`](arena_core::SessionStore)
//! - [`StaticIdentity`]: fixed-actor [`IdentityProvider`](arena_core::IdentityProvider)
//!
//! Fault-injecting wrappers belong in `arena-testkit`, not here.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod identity;
pub mod store;

pub use identity::StaticIdentity;
pub use store::MemorySessionStore;
