//! Arena Testing Infrastructure
//!
//! Shared helpers for the Arena test suites:
//!
//! - [`fixtures`]: deterministic players, actors and sessions
//! - [`strategies`]: proptest strategies for core types
//! - [`stores`]: store wrappers injecting conflicts, outages and latency
//! - [`assertions`]: invariant checks over single snapshots and histories
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! arena-testkit = { workspace = true }
//! ```

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

pub mod assertions;
pub mod fixtures;
pub mod stores;
pub mod strategies;

pub use assertions::*;
pub use fixtures::*;
pub use stores::{CommitFault, FaultyStore, SlowStore};

/// Install a test-friendly tracing subscriber honouring `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs anything.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
