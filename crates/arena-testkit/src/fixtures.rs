//! Deterministic test fixtures
//!
//! Identifiers are derived from a one-byte seed so tests can refer to
//! "player 3" without storing it.

use arena_core::{Actor, PlayerId, Role, Session, SessionId, SessionState, Score};
use arena_effects::StaticIdentity;

/// Create a test player id with a given seed.
pub fn test_player(seed: u8) -> PlayerId {
    PlayerId::from_bytes([seed; 16])
}

/// `count` distinct players, seeded from 1
pub fn test_players(count: u8) -> Vec<PlayerId> {
    (1..=count).map(test_player).collect()
}

/// Create a test actor with the given roles.
pub fn test_actor(seed: u8, roles: &[Role]) -> Actor {
    Actor::new(test_player(seed), format!("player-{seed}"), roles.iter().copied())
}

/// Actor holding only the `user` role
pub fn test_user(seed: u8) -> Actor {
    test_actor(seed, &[Role::User])
}

/// Actor holding the `admin` role
pub fn test_admin(seed: u8) -> Actor {
    test_actor(seed, &[Role::Admin])
}

/// Actor holding the `super-user` role
pub fn test_super_user(seed: u8) -> Actor {
    test_actor(seed, &[Role::SuperUser])
}

/// Identity provider for `actor`
pub fn identity_of(actor: Actor) -> StaticIdentity {
    StaticIdentity::new(actor)
}

/// A waiting session holding `members` players seeded from 1.
///
/// # Panics
/// If `members` exceeds `max_players`.
pub fn test_session(max_players: u32, members: u8) -> Session {
    let mut session = Session::new(SessionId::new(), "test session", max_players, None).unwrap();
    session.players = test_players(members);
    session.check_invariants().unwrap();
    session
}

/// Force a session into `state`, setting or clearing the score to match.
pub fn with_state(mut session: Session, state: SessionState) -> Session {
    session.state = state;
    session.score = (state == SessionState::Finished).then_some(Score::new(0));
    session
}
