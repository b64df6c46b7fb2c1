// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token claims and the authenticated caller representation.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::directory::UserRecord;
use super::roles::Role;

/// Claims carried inside a signed token.
///
/// Every field is required; a token whose payload lacks one fails to decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaim {
    /// Email of the subject; the identity anchor checked against the user directory
    pub email: String,

    /// Issuer
    pub iss: String,

    /// Expiration timestamp (Unix seconds)
    pub exp: i64,
}

impl IdentityClaim {
    /// Build a claim that expires `ttl` after `issued_at`. An expiry past the
    /// representable range saturates at the latest representable instant.
    pub fn new(
        email: impl Into<String>,
        issuer: impl Into<String>,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            email: email.into(),
            iss: issuer.into(),
            exp: issued_at
                .checked_add_signed(ttl)
                .unwrap_or(DateTime::<Utc>::MAX_UTC)
                .timestamp(),
        }
    }

    /// Whether the claim has expired at `now`. A claim expiring exactly at
    /// `now` is still valid.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.exp < now.timestamp()
    }
}

/// Authenticated caller resolved for the current request.
///
/// This is the primary type handlers use to represent who is making the
/// request. It is rebuilt from the user directory on every request and never
/// persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CallerIdentity {
    /// Numeric user ID
    pub id: u64,

    /// Email the token was issued for
    pub email: String,

    /// Current role from the directory
    #[schema(value_type = u8, example = 2)]
    pub role: Role,
}

impl From<UserRecord> for CallerIdentity {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            email: record.email,
            role: record.role,
        }
    }
}
