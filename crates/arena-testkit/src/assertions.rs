//! Invariant assertions for sessions and their histories

use arena_core::{PlayerId, Session};

/// Assert that a snapshot satisfies every structural invariant.
#[track_caller]
pub fn assert_session_invariants(session: &Session) {
    if let Err(err) = session.check_invariants() {
        panic!("session invariant violated: {err}\n{session:#?}");
    }
}

/// Assert that each snapshot in `history` is a legal successor of the previous.
///
/// Snapshots must be ordered by version; equal versions must be identical.
#[track_caller]
pub fn assert_history_monotonic(history: &[Session]) {
    for pair in history.windows(2) {
        let (before, after) = (&pair[0], &pair[1]);
        assert!(
            after.version >= before.version,
            "version went backwards: {} -> {}",
            before.version,
            after.version
        );
        if after.version == before.version {
            assert_eq!(before, after, "same version, different content");
            continue;
        }
        if let Err(err) = before.check_successor(after) {
            panic!("illegal transition: {err}\nbefore: {before:#?}\nafter: {after:#?}");
        }
    }
}

/// Assert that `session` lists exactly the players in `expected`, in any order.
#[track_caller]
pub fn assert_members(session: &Session, expected: &[PlayerId]) {
    let mut actual = session.players.clone();
    let mut expected = expected.to_vec();
    actual.sort();
    expected.sort();
    assert_eq!(actual, expected, "membership of {}", session.id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{test_player, test_session};
    use arena_core::SessionState;

    #[test]
    fn test_monotonic_history_passes() {
        let first = test_session(3, 1);
        let mut second = first.clone();
        second.players.push(test_player(9));
        second.version = 1;
        let mut third = second.clone();
        third.state = SessionState::InProgress;
        third.version = 2;

        assert_history_monotonic(&[first, second, third]);
    }

    #[test]
    #[should_panic(expected = "illegal transition")]
    fn test_regression_is_caught() {
        let mut first = test_session(3, 1);
        first.state = SessionState::InProgress;
        let mut second = first.clone();
        second.state = SessionState::Waiting;
        second.version = 1;

        assert_history_monotonic(&[first, second]);
    }

    #[test]
    fn test_members_ignores_order() {
        let session = test_session(3, 2);
        assert_members(&session, &[test_player(2), test_player(1)]);
    }
}
