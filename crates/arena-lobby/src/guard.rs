//! Role guard
//!
//! Maps every session operation to the roles allowed to perform it. The
//! mapping is declared statically in [`DEFAULT_REQUIREMENTS`] and checked by a
//! pure function; an operation with an empty role set admits any
//! authenticated actor.

use arena_core::{Actor, ArenaError, Role};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Operations exposed to the calling layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Create a session
    CreateSession,
    /// Join a session
    JoinSession,
    /// Start a session
    StartSession,
    /// End a session with a score
    EndSession,
    /// List sessions by state
    ListSessions,
    /// Read one session
    GetSession,
}

impl Operation {
    /// All operations
    pub const ALL: [Operation; 6] = [
        Self::CreateSession,
        Self::JoinSession,
        Self::StartSession,
        Self::EndSession,
        Self::ListSessions,
        Self::GetSession,
    ];

    /// Canonical name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateSession => "session:create",
            Self::JoinSession => "session:join",
            Self::StartSession => "session:start",
            Self::EndSession => "session:end",
            Self::ListSessions => "session:list",
            Self::GetSession => "session:get",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const OPERATORS: &[Role] = &[Role::Admin, Role::SuperUser];
const EVERYONE: &[Role] = &[Role::User, Role::Admin, Role::SuperUser];

/// Role requirements per operation.
pub const DEFAULT_REQUIREMENTS: &[(Operation, &[Role])] = &[
    (Operation::CreateSession, OPERATORS),
    (Operation::JoinSession, EVERYONE),
    (Operation::StartSession, OPERATORS),
    (Operation::EndSession, OPERATORS),
    (Operation::ListSessions, EVERYONE),
    (Operation::GetSession, EVERYONE),
];

/// Authorization check for session operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleGuard {
    requirements: BTreeMap<Operation, BTreeSet<Role>>,
}

impl RoleGuard {
    /// Guard with no requirements; every authenticated actor passes
    pub fn permissive() -> Self {
        Self {
            requirements: BTreeMap::new(),
        }
    }

    /// Replace the role set required for `operation`
    pub fn with_requirement(
        mut self,
        operation: Operation,
        roles: impl IntoIterator<Item = Role>,
    ) -> Self {
        self.requirements
            .insert(operation, roles.into_iter().collect());
        self
    }

    /// Roles accepted for `operation`; empty means no restriction
    pub fn required_roles(&self, operation: Operation) -> BTreeSet<Role> {
        self.requirements
            .get(&operation)
            .cloned()
            .unwrap_or_default()
    }

    /// Check whether `actor` may perform `operation`
    pub fn is_allowed(&self, actor: &Actor, operation: Operation) -> bool {
        match self.requirements.get(&operation) {
            None => true,
            Some(required) if required.is_empty() => true,
            Some(required) => actor.has_any_role(required),
        }
    }

    /// Like [`RoleGuard::is_allowed`], returning `Forbidden` on denial
    pub fn check(&self, actor: &Actor, operation: Operation) -> Result<(), ArenaError> {
        if self.is_allowed(actor, operation) {
            return Ok(());
        }

        tracing::warn!(
            actor = %actor.id,
            operation = %operation,
            roles = ?actor.roles,
            "operation forbidden"
        );
        Err(ArenaError::forbidden(actor.id, operation.as_str()))
    }
}

impl Default for RoleGuard {
    fn default() -> Self {
        DEFAULT_REQUIREMENTS
            .iter()
            .fold(Self::permissive(), |guard, (operation, roles)| {
                guard.with_requirement(*operation, roles.iter().copied())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_core::PlayerId;

    fn actor(roles: &[Role]) -> Actor {
        Actor::new(PlayerId::new(), "tester", roles.iter().copied())
    }

    #[test]
    fn test_every_operation_has_a_default() {
        let guard = RoleGuard::default();
        for operation in Operation::ALL {
            assert!(!guard.required_roles(operation).is_empty(), "{operation}");
        }
    }

    #[test]
    fn test_user_can_join_but_not_start() {
        let guard = RoleGuard::default();
        let user = actor(&[Role::User]);
        assert!(guard.check(&user, Operation::JoinSession).is_ok());
        assert!(guard.check(&user, Operation::ListSessions).is_ok());

        let err = guard.check(&user, Operation::StartSession).unwrap_err();
        assert!(matches!(err, ArenaError::Forbidden { ref operation, .. } if operation == "session:start"));
    }

    #[test]
    fn test_admin_can_manage() {
        let guard = RoleGuard::default();
        let admin = actor(&[Role::Admin]);
        for operation in [
            Operation::CreateSession,
            Operation::StartSession,
            Operation::EndSession,
        ] {
            assert!(guard.is_allowed(&admin, operation));
        }
    }

    #[test]
    fn test_actor_without_roles_is_denied() {
        let guard = RoleGuard::default();
        assert!(!guard.is_allowed(&actor(&[]), Operation::GetSession));
    }

    #[test]
    fn test_empty_requirement_admits_everyone() {
        let guard = RoleGuard::default().with_requirement(Operation::GetSession, Vec::<Role>::new());
        assert!(guard.is_allowed(&actor(&[]), Operation::GetSession));
        assert!(RoleGuard::permissive().is_allowed(&actor(&[]), Operation::EndSession));
    }
}
