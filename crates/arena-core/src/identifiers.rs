//! Core identifier types
//!
//! Opaque UUID-backed identifiers for sessions and players. Display output is
//! prefixed (`session-…`, `player-…`); parsing accepts either the prefixed or
//! the bare UUID form.

use crate::errors::ArenaError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

fn parse_prefixed(input: &str, prefix: &str, what: &str) -> Result<Uuid, ArenaError> {
    let raw = input.strip_prefix(prefix).unwrap_or(input);
    Uuid::parse_str(raw).map_err(|e| ArenaError::invalid(format!("invalid {what} '{input}': {e}")))
}

/// Identifier of a game session
///
/// Assigned by the registry at creation and never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Create a new random session ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from a UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = ArenaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_prefixed(s, "session-", "session id").map(Self)
    }
}

impl From<Uuid> for SessionId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Identifier of a player (an authenticated actor)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub Uuid);

impl PlayerId {
    /// Create a new random player ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a deterministic player ID from seed bytes
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    /// Get the inner UUID
    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for PlayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player-{}", self.0)
    }
}

impl FromStr for PlayerId {
    type Err = ArenaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_prefixed(s, "player-", "player id").map(Self)
    }
}

impl From<Uuid> for PlayerId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_session_id_display_and_parse() {
        let id = SessionId::new();
        let shown = id.to_string();
        assert!(shown.starts_with("session-"));
        assert_eq!(shown.parse::<SessionId>().unwrap(), id);
        assert_eq!(id.uuid().to_string().parse::<SessionId>().unwrap(), id);
    }

    #[test]
    fn test_player_id_from_bytes_is_stable() {
        let a = PlayerId::from_bytes([7u8; 16]);
        let b = PlayerId::from_bytes([7u8; 16]);
        assert_eq!(a, b);
        assert_ne!(a, PlayerId::from_bytes([8u8; 16]));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = "session-nope".parse::<SessionId>().unwrap_err();
        assert_matches!(err, ArenaError::InvalidArgument { .. });
        assert!("".parse::<PlayerId>().is_err());
    }
}
