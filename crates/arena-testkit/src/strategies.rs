//! Property test strategies for Arena types
//!
//! Identifiers are drawn from small seed ranges so generated values collide
//! often enough to exercise duplicate-membership paths.

use arena_core::{Actor, PlayerId, Role, Score, SessionState};
use proptest::prelude::*;

// Re-export proptest for convenience
pub use proptest;

/// Strategy for player ids drawn from `count` distinct seeds
pub fn arb_player_id(count: u8) -> impl Strategy<Value = PlayerId> {
    (0..count).prop_map(|seed| PlayerId::from_bytes([seed; 16]))
}

/// Strategy for roles
pub fn arb_role() -> impl Strategy<Value = Role> {
    prop_oneof![Just(Role::User), Just(Role::Admin), Just(Role::SuperUser)]
}

/// Strategy for actors with zero to three roles
pub fn arb_actor() -> impl Strategy<Value = Actor> {
    (arb_player_id(16), prop::collection::vec(arb_role(), 0..3))
        .prop_map(|(id, roles)| Actor::new(id, format!("actor-{id}"), roles))
}

/// Strategy for lifecycle states
pub fn arb_session_state() -> impl Strategy<Value = SessionState> {
    prop::sample::select(SessionState::ALL.to_vec())
}

/// Strategy for scores
pub fn arb_score() -> impl Strategy<Value = Score> {
    any::<i64>().prop_map(Score::new)
}

/// Strategy for valid session names
pub fn arb_session_name() -> impl Strategy<Value = String> {
    (0u16..1000).prop_map(|n| format!("table {n}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn arb_actor_ids_are_bounded(actor in arb_actor()) {
            prop_assert!(actor.roles.len() <= 3);
            prop_assert!(actor.id.uuid().as_bytes()[0] < 16);
        }

        #[test]
        fn arb_state_parses_back(state in arb_session_state()) {
            prop_assert_eq!(state.as_str().parse::<SessionState>().unwrap(), state);
        }
    }
}
