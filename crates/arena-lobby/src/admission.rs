//! Admission policy
//!
//! Pure decision logic: given a session snapshot and a requested action,
//! decide whether the action may be applied. Nothing here touches storage or
//! locks, so the registry can evaluate it under whatever exclusivity it holds
//! and the rules stay unit-testable on plain values.
//!
//! Join rules are evaluated in a fixed order so errors are deterministic:
//!
//! ```text
//! state == waiting?  → NotJoinable
//! already a member?  → AlreadyMember
//! capacity reached?  → SessionFull
//! ```

use arena_core::{
    ArenaError, EndPolicy, PlayerId, RegistryConfig, Score, Session, SessionState, StartPolicy,
};
use serde::{Deserialize, Serialize};

/// A state change requested against one session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Add a player to the member list
    Join(PlayerId),
    /// Move to `in_progress`
    Start,
    /// Record the score and move to `finished`
    End(Score),
}

impl Action {
    /// Operation name for logs and errors
    pub fn name(&self) -> &'static str {
        match self {
            Self::Join(_) => "join",
            Self::Start => "start",
            Self::End(_) => "end",
        }
    }

    /// Whether applying this action to `session` would alter it.
    ///
    /// Only a tolerated re-start is a no-op.
    pub fn changes(&self, session: &Session) -> bool {
        match self {
            Self::Join(_) | Self::End(_) => true,
            Self::Start => session.state != SessionState::InProgress,
        }
    }

    /// Apply the action to a session.
    ///
    /// Callers must have obtained [`AdmissionDecision::Allow`] for this exact
    /// snapshot first; this method does not re-check the rules.
    pub fn apply_to(&self, session: &mut Session) {
        match *self {
            Self::Join(player) => session.players.push(player),
            Self::Start => session.state = SessionState::InProgress,
            Self::End(score) => {
                session.state = SessionState::Finished;
                session.score = Some(score);
            }
        }
    }
}

/// Why an action was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// Session no longer admits players
    NotJoinable {
        /// State the session was in
        state: SessionState,
    },
    /// Player already listed
    AlreadyMember {
        /// The duplicate player
        player: PlayerId,
    },
    /// No free slot
    SessionFull {
        /// Capacity of the session
        max_players: u32,
    },
    /// Transition not permitted by the lifecycle or the configured policy
    InvalidTransition {
        /// Current state
        from: SessionState,
        /// Requested state
        to: SessionState,
    },
}

impl DenyReason {
    /// Convert into the error reported to callers
    pub fn into_error(self, session: &Session) -> ArenaError {
        let session_id = session.id;
        match self {
            Self::NotJoinable { state } => ArenaError::NotJoinable { session_id, state },
            Self::AlreadyMember { player } => ArenaError::AlreadyMember { session_id, player },
            Self::SessionFull { max_players } => ArenaError::SessionFull {
                session_id,
                max_players,
            },
            Self::InvalidTransition { from, to } => ArenaError::InvalidTransition {
                session_id,
                from,
                to,
            },
        }
    }
}

/// Outcome of evaluating an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdmissionDecision {
    /// The action may be applied to the evaluated snapshot
    Allow,
    /// The action must not be applied
    Deny(DenyReason),
}

impl AdmissionDecision {
    /// Check if the decision allows the action
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Turn a denial into the matching error for `session`
    pub fn into_result(self, session: &Session) -> Result<(), ArenaError> {
        match self {
            Self::Allow => Ok(()),
            Self::Deny(reason) => Err(reason.into_error(session)),
        }
    }
}

/// Capacity, membership and lifecycle rules for sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AdmissionPolicy {
    start: StartPolicy,
    end: EndPolicy,
}

impl AdmissionPolicy {
    /// Create a policy with explicit transition rules
    pub fn new(start: StartPolicy, end: EndPolicy) -> Self {
        Self { start, end }
    }

    /// Create a policy from registry configuration
    pub fn from_config(config: &RegistryConfig) -> Self {
        Self::new(config.start_policy, config.end_policy)
    }

    /// Configured start behaviour
    pub fn start_policy(&self) -> StartPolicy {
        self.start
    }

    /// Configured end behaviour
    pub fn end_policy(&self) -> EndPolicy {
        self.end
    }

    /// Decide whether `action` may be applied to `session`
    pub fn evaluate(&self, session: &Session, action: &Action) -> AdmissionDecision {
        let decision = match action {
            Action::Join(player) => Self::evaluate_join(session, player),
            Action::Start => self.evaluate_start(session),
            Action::End(_) => self.evaluate_end(session),
        };

        if let AdmissionDecision::Deny(reason) = decision {
            tracing::debug!(
                session_id = %session.id,
                action = action.name(),
                ?reason,
                "admission denied"
            );
        }
        decision
    }

    fn evaluate_join(session: &Session, player: &PlayerId) -> AdmissionDecision {
        if !session.is_joinable() {
            return AdmissionDecision::Deny(DenyReason::NotJoinable {
                state: session.state,
            });
        }

        if session.is_member(player) {
            return AdmissionDecision::Deny(DenyReason::AlreadyMember { player: *player });
        }

        if session.is_full() {
            return AdmissionDecision::Deny(DenyReason::SessionFull {
                max_players: session.max_players,
            });
        }

        AdmissionDecision::Allow
    }

    fn evaluate_start(&self, session: &Session) -> AdmissionDecision {
        match (session.state, self.start) {
            (SessionState::Waiting, _) => AdmissionDecision::Allow,
            (SessionState::InProgress, StartPolicy::Tolerant) => AdmissionDecision::Allow,
            (from, _) => AdmissionDecision::Deny(DenyReason::InvalidTransition {
                from,
                to: SessionState::InProgress,
            }),
        }
    }

    fn evaluate_end(&self, session: &Session) -> AdmissionDecision {
        match (session.state, self.end) {
            (SessionState::InProgress, _) => AdmissionDecision::Allow,
            (SessionState::Waiting, EndPolicy::Lenient) => AdmissionDecision::Allow,
            (from, _) => AdmissionDecision::Deny(DenyReason::InvalidTransition {
                from,
                to: SessionState::Finished,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_core::SessionId;
    use assert_matches::assert_matches;

    fn player(seed: u8) -> PlayerId {
        PlayerId::from_bytes([seed; 16])
    }

    fn session_with(max_players: u32, players: &[u8], state: SessionState) -> Session {
        let mut session = Session::new(SessionId::new(), "A", max_players, None).unwrap();
        session.players = players.iter().map(|s| player(*s)).collect();
        session.state = state;
        if state == SessionState::Finished {
            session.score = Some(Score::new(0));
        }
        session
    }

    #[test]
    fn test_join_allowed_with_free_slot() {
        let session = session_with(2, &[1], SessionState::Waiting);
        let decision = AdmissionPolicy::default().evaluate(&session, &Action::Join(player(2)));
        assert_eq!(decision, AdmissionDecision::Allow);
    }

    #[test]
    fn test_duplicate_checked_before_capacity() {
        let session = session_with(2, &[1, 2], SessionState::Waiting);
        let decision = AdmissionPolicy::default().evaluate(&session, &Action::Join(player(1)));
        assert_matches!(
            decision,
            AdmissionDecision::Deny(DenyReason::AlreadyMember { .. })
        );
    }

    #[test]
    fn test_state_checked_before_membership() {
        let session = session_with(2, &[1], SessionState::InProgress);
        let decision = AdmissionPolicy::default().evaluate(&session, &Action::Join(player(1)));
        assert_matches!(
            decision,
            AdmissionDecision::Deny(DenyReason::NotJoinable {
                state: SessionState::InProgress
            })
        );
    }

    #[test]
    fn test_full_session_denied() {
        let session = session_with(2, &[1, 2], SessionState::Waiting);
        let decision = AdmissionPolicy::default().evaluate(&session, &Action::Join(player(3)));
        assert_eq!(
            decision,
            AdmissionDecision::Deny(DenyReason::SessionFull { max_players: 2 })
        );
    }

    #[test]
    fn test_tolerant_restart_is_noop() {
        let session = session_with(2, &[], SessionState::InProgress);
        let policy = AdmissionPolicy::new(StartPolicy::Tolerant, EndPolicy::Strict);
        assert!(policy.evaluate(&session, &Action::Start).is_allowed());
        assert!(!Action::Start.changes(&session));
    }

    #[test]
    fn test_strict_restart_denied() {
        let session = session_with(2, &[], SessionState::InProgress);
        let policy = AdmissionPolicy::new(StartPolicy::Strict, EndPolicy::Strict);
        assert_matches!(
            policy.evaluate(&session, &Action::Start),
            AdmissionDecision::Deny(DenyReason::InvalidTransition { .. })
        );
    }

    #[test]
    fn test_start_after_finish_always_denied() {
        let session = session_with(2, &[], SessionState::Finished);
        for start in [StartPolicy::Tolerant, StartPolicy::Strict] {
            let policy = AdmissionPolicy::new(start, EndPolicy::Lenient);
            assert!(!policy.evaluate(&session, &Action::Start).is_allowed());
        }
    }

    #[test]
    fn test_end_policies() {
        let waiting = session_with(2, &[], SessionState::Waiting);
        let end = Action::End(Score::new(10));

        let strict = AdmissionPolicy::new(StartPolicy::Tolerant, EndPolicy::Strict);
        assert_matches!(
            strict.evaluate(&waiting, &end),
            AdmissionDecision::Deny(DenyReason::InvalidTransition {
                from: SessionState::Waiting,
                to: SessionState::Finished
            })
        );

        let lenient = AdmissionPolicy::new(StartPolicy::Tolerant, EndPolicy::Lenient);
        assert!(lenient.evaluate(&waiting, &end).is_allowed());

        let finished = session_with(2, &[], SessionState::Finished);
        assert!(!lenient.evaluate(&finished, &end).is_allowed());
    }

    #[test]
    fn test_apply_end_sets_score() {
        let mut session = session_with(2, &[1], SessionState::InProgress);
        Action::End(Score::new(10)).apply_to(&mut session);
        assert_eq!(session.state, SessionState::Finished);
        assert_eq!(session.score, Some(Score::new(10)));
        session.check_invariants().unwrap();
    }

    #[test]
    fn test_denial_maps_to_error() {
        let session = session_with(1, &[1], SessionState::Waiting);
        let err = AdmissionPolicy::default()
            .evaluate(&session, &Action::Join(player(2)))
            .into_result(&session)
            .unwrap_err();
        assert_eq!(
            err,
            ArenaError::SessionFull {
                session_id: session.id,
                max_players: 1
            }
        );
    }
}
