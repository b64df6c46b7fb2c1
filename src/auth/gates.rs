// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request-level authorization decisions.
//!
//! Both gates are pure functions of their inputs. Callers must act on the
//! [`Decision`] (continue or terminate) before mutating anything.

use super::{AuthError, Role};

/// Outcome of an authorization gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        self == Decision::Allow
    }

    /// `Deny` becomes [`AuthError::Forbidden`].
    pub fn into_result(self) -> Result<(), AuthError> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny => Err(AuthError::Forbidden),
        }
    }
}

impl From<bool> for Decision {
    fn from(allowed: bool) -> Self {
        if allowed {
            Decision::Allow
        } else {
            Decision::Deny
        }
    }
}

/// Restricts an operation to exactly one role.
///
/// Only a single permitted role per operation is supported; "any of {A, B}"
/// would need set membership instead of equality.
pub struct RoleGate;

impl RoleGate {
    pub fn authorize(caller_role: Role, required_role: Role) -> Decision {
        (caller_role == required_role).into()
    }
}

/// Allows the resource's owner, or anyone holding the privileged role.
///
/// Evaluate only after the resource has been fetched.
pub struct OwnershipGate;

impl OwnershipGate {
    pub fn authorize(
        caller_id: u64,
        caller_role: Role,
        resource_owner_id: u64,
        privileged_role: Role,
    ) -> Decision {
        (caller_id == resource_owner_id || caller_role == privileged_role).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROLES: [Role; 2] = [Role::Qa, Role::Developer];

    #[test]
    fn role_gate_allows_equal_roles() {
        for role in ROLES {
            assert_eq!(RoleGate::authorize(role, role), Decision::Allow);
        }
    }

    #[test]
    fn role_gate_denies_different_roles() {
        for caller in ROLES {
            for required in ROLES {
                if caller != required {
                    assert_eq!(RoleGate::authorize(caller, required), Decision::Deny);
                }
            }
        }
    }

    #[test]
    fn role_gate_qa_only_operation() {
        assert_eq!(RoleGate::authorize(Role::Developer, Role::Qa), Decision::Deny);
        assert_eq!(RoleGate::authorize(Role::Qa, Role::Qa), Decision::Allow);
    }

    #[test]
    fn owner_is_allowed_regardless_of_role() {
        for role in ROLES {
            assert_eq!(
                OwnershipGate::authorize(42, role, 42, Role::Qa),
                Decision::Allow
            );
        }
    }

    #[test]
    fn owner_match_short_circuits_role_check() {
        assert_eq!(
            OwnershipGate::authorize(42, Role::Developer, 42, Role::Qa),
            Decision::Allow
        );
    }

    #[test]
    fn privileged_role_overrides_ownership() {
        assert_eq!(
            OwnershipGate::authorize(1, Role::Qa, 2, Role::Qa),
            Decision::Allow
        );
    }

    #[test]
    fn non_owner_without_privilege_is_denied() {
        assert_eq!(
            OwnershipGate::authorize(1, Role::Developer, 2, Role::Qa),
            Decision::Deny
        );
    }

    #[test]
    fn deny_maps_to_forbidden() {
        assert_eq!(Decision::Deny.into_result(), Err(AuthError::Forbidden));
        assert_eq!(Decision::Allow.into_result(), Ok(()));
    }
}
