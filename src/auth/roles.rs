// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User roles for authorization.

use serde::{Deserialize, Serialize};

/// User roles for authorization.
///
/// Roles travel as small integer codes (forms, JSON bodies, storage).
///
/// ## Role Codes
///
/// - `1` - `Qa`: privileged role, may create/delete issues and override ownership
/// - `2` - `Developer`: reporter role, may only modify what they created
///
/// In OpenAPI schemas, fields of this type are documented as `u8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Role {
    /// Quality assurance (privileged)
    Qa,
    /// Developer (reporter)
    Developer,
}

impl Role {
    /// The single role allowed to bypass ownership checks.
    pub const PRIVILEGED: Role = Role::Qa;

    /// Numeric role code as stored and transmitted.
    pub const fn code(&self) -> u8 {
        match self {
            Role::Qa => 1,
            Role::Developer => 2,
        }
    }

    /// Parse a numeric role code.
    pub fn from_code(code: u8) -> Option<Role> {
        match code {
            1 => Some(Role::Qa),
            2 => Some(Role::Developer),
            _ => None,
        }
    }
}

impl TryFrom<u8> for Role {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Role::from_code(code).ok_or_else(|| format!("unknown role code {code}"))
    }
}

impl From<Role> for u8 {
    fn from(role: Role) -> Self {
        role.code()
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Qa => write!(f, "qa"),
            Role::Developer => write!(f, "developer"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        assert_eq!(Role::from_code(1), Some(Role::Qa));
        assert_eq!(Role::from_code(2), Some(Role::Developer));
        assert_eq!(Role::from_code(0), None);
        assert_eq!(Role::from_code(3), None);
        assert_eq!(Role::Qa.code(), 1);
        assert_eq!(Role::Developer.code(), 2);
    }

    #[test]
    fn only_qa_is_privileged() {
        assert_eq!(Role::PRIVILEGED, Role::Qa);
        assert_ne!(Role::PRIVILEGED, Role::Developer);
    }

    #[test]
    fn serializes_as_integer_code() {
        assert_eq!(serde_json::to_string(&Role::Qa).unwrap(), "1");
        assert_eq!(serde_json::from_str::<Role>("2").unwrap(), Role::Developer);
        assert!(serde_json::from_str::<Role>("7").is_err());
    }
}
