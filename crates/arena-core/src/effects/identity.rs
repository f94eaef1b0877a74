//! Identity effects
//!
//! The identity provider hands the core an already-verified actor for the
//! current request. How that verification happens is outside this crate.

use crate::actor::Actor;
use crate::errors::Result;

/// Source of the authenticated actor for a request
pub trait IdentityProvider: Send + Sync {
    /// The actor performing the current request, or
    /// [`ArenaError::Unauthenticated`](crate::ArenaError::Unauthenticated)
    fn current_actor(&self) -> Result<Actor>;
}
