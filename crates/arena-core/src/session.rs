//! Session aggregate
//!
//! A [`Session`] is one game lobby: a fixed capacity, a unique member list and
//! a lifecycle that only moves forward (`waiting → in_progress → finished`).
//! The registry is the only writer; everything else reads snapshots.

use crate::errors::{ArenaError, Result};
use crate::identifiers::{PlayerId, SessionId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Accepting players
    Waiting,
    /// Match running; membership frozen
    InProgress,
    /// Terminal; score recorded
    Finished,
}

impl SessionState {
    /// All states in lifecycle order
    pub const ALL: [SessionState; 3] = [Self::Waiting, Self::InProgress, Self::Finished];

    /// Canonical lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::InProgress => "in_progress",
            Self::Finished => "finished",
        }
    }

    /// No transition leaves a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished)
    }

    /// Whether `next` is reachable from `self` without moving backwards.
    ///
    /// Staying in place counts as reachable for non-terminal states.
    pub fn can_advance_to(&self, next: SessionState) -> bool {
        if self.is_terminal() {
            return false;
        }
        next >= *self
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionState {
    type Err = ArenaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "waiting" => Ok(Self::Waiting),
            "in_progress" => Ok(Self::InProgress),
            "finished" => Ok(Self::Finished),
            other => Err(ArenaError::invalid(format!(
                "invalid session state '{other}' (expected waiting, in_progress or finished)"
            ))),
        }
    }
}

/// Final score of a finished session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Score(i64);

impl Score {
    /// Create a new score
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Return the raw value
    pub const fn value(self) -> i64 {
        self.0
    }
}

impl From<i64> for Score {
    fn from(value: i64) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Snapshot of a game session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Unique identifier
    pub id: SessionId,
    /// Display label
    pub name: String,
    /// Capacity, fixed at creation
    pub max_players: u32,
    /// Lifecycle state
    pub state: SessionState,
    /// Members in join order
    pub players: Vec<PlayerId>,
    /// Final score, present only once finished
    pub score: Option<Score>,
    /// Store-owned revision counter, bumped on every committed update
    pub version: u64,
}

impl Session {
    /// Build a fresh waiting session, optionally seeded with one player.
    pub fn new(
        id: SessionId,
        name: impl Into<String>,
        max_players: u32,
        seed: Option<PlayerId>,
    ) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ArenaError::invalid("session name must not be empty"));
        }
        if max_players < 1 {
            return Err(ArenaError::invalid("maxPlayers must be at least 1"));
        }

        Ok(Self {
            id,
            name,
            max_players,
            state: SessionState::Waiting,
            players: seed.into_iter().collect(),
            score: None,
            version: 0,
        })
    }

    /// Number of current members
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Remaining free slots
    pub fn available_slots(&self) -> usize {
        (self.max_players as usize).saturating_sub(self.players.len())
    }

    /// Check if the session has no free slot
    pub fn is_full(&self) -> bool {
        self.available_slots() == 0
    }

    /// Check if a player is a member
    pub fn is_member(&self, player: &PlayerId) -> bool {
        self.players.contains(player)
    }

    /// Check if the session still admits players (ignoring capacity)
    pub fn is_joinable(&self) -> bool {
        self.state == SessionState::Waiting
    }

    /// Verify the structural invariants of a snapshot.
    ///
    /// Transition invariants (monotonic state, frozen membership) need two
    /// snapshots and are checked by [`Session::check_successor`].
    pub fn check_invariants(&self) -> Result<()> {
        if self.players.len() > self.max_players as usize {
            return Err(ArenaError::invalid(format!(
                "{} holds {} players but allows {}",
                self.id,
                self.players.len(),
                self.max_players
            )));
        }

        for (i, player) in self.players.iter().enumerate() {
            if self.players[..i].contains(player) {
                return Err(ArenaError::invalid(format!(
                    "{} lists {player} more than once",
                    self.id
                )));
            }
        }

        if self.score.is_some() != (self.state == SessionState::Finished) {
            return Err(ArenaError::invalid(format!(
                "{} has score {:?} in state {}",
                self.id, self.score, self.state
            )));
        }

        Ok(())
    }

    /// Verify that `next` is a legal successor of this snapshot.
    pub fn check_successor(&self, next: &Session) -> Result<()> {
        next.check_invariants()?;

        if next.id != self.id || next.max_players != self.max_players || next.name != self.name {
            return Err(ArenaError::invalid(format!(
                "{} changed an immutable field",
                self.id
            )));
        }

        if next.state != self.state && !self.state.can_advance_to(next.state) {
            return Err(ArenaError::InvalidTransition {
                session_id: self.id,
                from: self.state,
                to: next.state,
            });
        }

        if next.players != self.players && self.state != SessionState::Waiting {
            return Err(ArenaError::invalid(format!(
                "{} changed membership while {}",
                self.id, self.state
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn player(seed: u8) -> PlayerId {
        PlayerId::from_bytes([seed; 16])
    }

    #[test]
    fn test_new_session_is_waiting() {
        let session = Session::new(SessionId::new(), "A", 2, None).unwrap();
        assert_eq!(session.state, SessionState::Waiting);
        assert!(session.players.is_empty());
        assert!(session.score.is_none());
        assert_eq!(session.version, 0);
        assert_eq!(session.available_slots(), 2);
        session.check_invariants().unwrap();
    }

    #[test]
    fn test_new_session_with_seed() {
        let session = Session::new(SessionId::new(), "A", 1, Some(player(1))).unwrap();
        assert!(session.is_member(&player(1)));
        assert!(session.is_full());
    }

    #[test]
    fn test_new_session_rejects_bad_input() {
        assert_matches!(
            Session::new(SessionId::new(), "A", 0, None),
            Err(ArenaError::InvalidArgument { .. })
        );
        assert_matches!(
            Session::new(SessionId::new(), "   ", 4, None),
            Err(ArenaError::InvalidArgument { .. })
        );
    }

    #[test]
    fn test_state_parsing() {
        assert_eq!("waiting".parse::<SessionState>().unwrap(), SessionState::Waiting);
        assert_eq!(
            "IN_PROGRESS".parse::<SessionState>().unwrap(),
            SessionState::InProgress
        );
        assert_eq!("finished".parse::<SessionState>().unwrap(), SessionState::Finished);
        assert!("paused".parse::<SessionState>().is_err());
    }

    #[test]
    fn test_state_ordering() {
        assert!(SessionState::Waiting.can_advance_to(SessionState::InProgress));
        assert!(SessionState::Waiting.can_advance_to(SessionState::Finished));
        assert!(SessionState::InProgress.can_advance_to(SessionState::InProgress));
        assert!(!SessionState::InProgress.can_advance_to(SessionState::Waiting));
        for next in SessionState::ALL {
            assert!(!SessionState::Finished.can_advance_to(next));
        }
    }

    #[test]
    fn test_invariant_checks() {
        let mut session = Session::new(SessionId::new(), "A", 1, None).unwrap();
        session.players = vec![player(1), player(2)];
        assert!(session.check_invariants().is_err());

        session.max_players = 3;
        session.players = vec![player(1), player(1)];
        assert!(session.check_invariants().is_err());

        session.players = vec![player(1)];
        session.score = Some(Score::new(5));
        assert!(session.check_invariants().is_err());
    }

    #[test]
    fn test_successor_rejects_regression() {
        let mut current = Session::new(SessionId::new(), "A", 2, None).unwrap();
        current.state = SessionState::InProgress;

        let mut next = current.clone();
        next.state = SessionState::Waiting;
        assert_matches!(
            current.check_successor(&next),
            Err(ArenaError::InvalidTransition { .. })
        );

        let mut joined = current.clone();
        joined.players.push(player(9));
        assert!(current.check_successor(&joined).is_err());
    }

    #[test]
    fn test_serialized_shape() {
        let session = Session::new(SessionId::new(), "A", 2, None).unwrap();
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["state"], "waiting");
        assert_eq!(json["maxPlayers"], 2);
        assert!(json["score"].is_null());
    }
}
