//! Effect interfaces consumed by the registry
//!
//! Implementations live in `arena-effects`; fault-injecting wrappers for tests
//! live in `arena-testkit`.

pub mod identity;
pub mod store;

pub use identity::IdentityProvider;
pub use store::{SessionMutation, SessionStore, StoreError};
