// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token validation against the user directory.
//!
//! ## Validation Flow
//!
//! 1. Empty token → `MissingCredential`
//! 2. Signature/structure check via [`TokenCodec`]
//! 3. Issuer must match the configured issuer
//! 4. `exp` strictly before now → `Expired`
//! 5. Claim email must resolve to a current user → `UnknownSubject`
//!
//! The email, not the numeric ID, is what the token carries, so a user
//! whose email changes invalidates every token issued before the change.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use super::{
    claims::{CallerIdentity, IdentityClaim},
    codec::TokenCodec,
    directory::UserDirectory,
    AuthError,
};

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Immutable token settings supplied at startup.
#[derive(Debug, Clone)]
pub struct TokenSettings {
    /// HMAC signing secret
    pub secret: String,
    /// Issuer written into and expected from every token
    pub issuer: String,
    /// Lifetime of a normal login
    pub default_ttl: Duration,
    /// Lifetime of a "remember me" login
    pub remembered_ttl: Duration,
}

impl TokenSettings {
    pub fn new(secret: impl Into<String>, issuer: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            issuer: issuer.into(),
            default_ttl: Duration::hours(24),
            remembered_ttl: Duration::hours(8760),
        }
    }

    pub fn with_ttls(mut self, default_ttl: Duration, remembered_ttl: Duration) -> Self {
        self.default_ttl = default_ttl;
        self.remembered_ttl = remembered_ttl;
        self
    }

    /// Lifetime for a login, depending on "remember me".
    pub fn ttl(&self, remembered: bool) -> Duration {
        if remembered {
            self.remembered_ttl
        } else {
            self.default_ttl
        }
    }
}

/// Issues tokens at login and resolves callers from tokens afterwards.
pub struct AuthValidator<D> {
    codec: TokenCodec,
    settings: TokenSettings,
    directory: D,
    clock: Arc<dyn Clock>,
}

impl<D: UserDirectory> AuthValidator<D> {
    pub fn new(settings: TokenSettings, directory: D) -> Self {
        Self::with_clock(settings, directory, Arc::new(SystemClock))
    }

    pub fn with_clock(settings: TokenSettings, directory: D, clock: Arc<dyn Clock>) -> Self {
        Self {
            codec: TokenCodec::new(settings.secret.as_bytes()),
            settings,
            directory,
            clock,
        }
    }

    pub fn settings(&self) -> &TokenSettings {
        &self.settings
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    /// Issue a token for `email` valid from now.
    pub fn issue_for(
        &self,
        email: &str,
        remembered: bool,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let claim = IdentityClaim::new(
            email,
            self.settings.issuer.as_str(),
            self.clock.now(),
            self.settings.ttl(remembered),
        );
        self.codec.issue(&claim)
    }

    /// Validate a raw token and resolve the caller.
    pub fn validate(&self, raw_token: &str) -> Result<CallerIdentity, AuthError> {
        let raw_token = raw_token.trim();
        if raw_token.is_empty() {
            return Err(AuthError::MissingCredential);
        }

        let claim = self.codec.decode(raw_token)?;

        if claim.iss != self.settings.issuer {
            return Err(AuthError::InvalidIssuer);
        }

        if claim.is_expired_at(self.clock.now()) {
            return Err(AuthError::Expired);
        }

        let record = self
            .directory
            .find_by_email(&claim.email)?
            .ok_or(AuthError::UnknownSubject)?;

        Ok(record.into())
    }
}
