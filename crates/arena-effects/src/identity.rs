//! Static identity provider
//!
//! Hands out a fixed actor, or none at all. Used by the CLI and in tests, where
//! the actor is known up front rather than extracted from a request.

use arena_core::{Actor, ArenaError, IdentityProvider, Result};

/// Identity provider returning a preconfigured actor
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity {
    actor: Option<Actor>,
}

impl StaticIdentity {
    /// Provider that always yields `actor`
    pub fn new(actor: Actor) -> Self {
        Self { actor: Some(actor) }
    }

    /// Provider with no authenticated actor
    pub fn anonymous() -> Self {
        Self { actor: None }
    }
}

impl From<Actor> for StaticIdentity {
    fn from(actor: Actor) -> Self {
        Self::new(actor)
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_actor(&self) -> Result<Actor> {
        self.actor.clone().ok_or(ArenaError::Unauthenticated)
    }
}
