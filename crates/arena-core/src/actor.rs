//! Authenticated actors and their roles

use crate::errors::ArenaError;
use crate::identifiers::PlayerId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Role granted to an actor by the identity provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    /// Regular player
    User,
    /// Session operator
    Admin,
    /// Unrestricted operator
    SuperUser,
}

impl Role {
    /// Canonical name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
            Self::SuperUser => "super-user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ArenaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            "super-user" => Ok(Self::SuperUser),
            other => Err(ArenaError::invalid(format!("unknown role '{other}'"))),
        }
    }
}

/// Verified identity supplied by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    /// Player identifier
    pub id: PlayerId,
    /// Human-readable name
    pub display_name: String,
    /// Granted roles
    pub roles: BTreeSet<Role>,
}

impl Actor {
    /// Create an actor with the given roles
    pub fn new(
        id: PlayerId,
        display_name: impl Into<String>,
        roles: impl IntoIterator<Item = Role>,
    ) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            roles: roles.into_iter().collect(),
        }
    }

    /// Check if the actor holds a role
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Check if the actor holds at least one of `roles`
    pub fn has_any_role(&self, roles: &BTreeSet<Role>) -> bool {
        !self.roles.is_disjoint(roles)
    }
}
