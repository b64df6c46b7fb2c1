// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User directory capability consumed by the validator.
//!
//! The validator never talks to storage directly; it only asks a
//! [`UserDirectory`] who owns an email or an ID. The production
//! implementation lives on [`crate::storage::Store`].

use std::sync::Arc;

use super::roles::Role;

/// Minimal view of a user needed for authorization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: u64,
    pub email: String,
    pub role: Role,
}

/// Directory lookup failed for infrastructure reasons (not "no such user").
#[derive(Debug, Clone, thiserror::Error)]
#[error("user directory unavailable: {0}")]
pub struct DirectoryError(pub String);

/// Read-only user lookups.
///
/// Both lookups are synchronous and side-effect free. `Ok(None)` means the
/// user does not exist; `Err` is reserved for backing store failures.
pub trait UserDirectory: Send + Sync {
    fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, DirectoryError>;

    fn find_by_id(&self, id: u64) -> Result<Option<UserRecord>, DirectoryError>;
}

impl<D: UserDirectory + ?Sized> UserDirectory for Arc<D> {
    fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, DirectoryError> {
        (**self).find_by_email(email)
    }

    fn find_by_id(&self, id: u64) -> Result<Option<UserRecord>, DirectoryError> {
        (**self).find_by_id(id)
    }
}
