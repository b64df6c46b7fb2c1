// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User repository.
//!
//! Emails are unique case-insensitively; the index stores them lowercased.
//! The repository also backs the [`UserDirectory`] used by token validation.

use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable};
use serde::{Deserialize, Serialize};

use crate::auth::{DirectoryError, Role, UserDirectory, UserRecord};

use super::super::db::{next_id, Store, StoreError, StoreResult, USERS, USER_EMAIL_INDEX};

/// Maximum length of a display name.
pub const MAX_NAME_LENGTH: usize = 100;

/// Maximum length of an email address.
pub const MAX_EMAIL_LENGTH: usize = 300;

/// User as persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredUser {
    pub id: u64,
    pub role: Role,
    pub name: String,
    pub email: String,
    /// bcrypt hash, never leaves the server
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&StoredUser> for UserRecord {
    fn from(user: &StoredUser) -> Self {
        UserRecord {
            id: user.id,
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// Fields needed to register a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub role: Role,
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

fn email_key(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Repository for user operations.
pub struct UserRepository<'a> {
    store: &'a Store,
}

impl<'a> UserRepository<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Create a user. Fails with `AlreadyExists` if the email is taken.
    pub fn create(&self, new_user: NewUser) -> StoreResult<StoredUser> {
        let key = email_key(&new_user.email);
        let now = Utc::now();

        let write_txn = self.store.db().begin_write()?;
        let user = {
            let mut index = write_txn.open_table(USER_EMAIL_INDEX)?;
            if index.get(key.as_str())?.is_some() {
                return Err(StoreError::AlreadyExists(format!(
                    "User with email {}",
                    new_user.email
                )));
            }

            let id = next_id(&write_txn, "users")?;
            let user = StoredUser {
                id,
                role: new_user.role,
                name: new_user.name,
                email: new_user.email.trim().to_string(),
                password_hash: new_user.password_hash,
                created_at: now,
                updated_at: now,
            };

            let json = serde_json::to_vec(&user)?;
            let mut users = write_txn.open_table(USERS)?;
            users.insert(id, json.as_slice())?;
            index.insert(key.as_str(), id)?;
            user
        };
        write_txn.commit()?;

        Ok(user)
    }

    /// Look up a user by ID.
    pub fn find(&self, id: u64) -> StoreResult<Option<StoredUser>> {
        let read_txn = self.store.db().begin_read()?;
        let table = read_txn.open_table(USERS)?;
        match table.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get a user by ID, failing with `NotFound`.
    pub fn get(&self, id: u64) -> StoreResult<StoredUser> {
        self.find(id)?
            .ok_or_else(|| StoreError::NotFound(format!("User {id}")))
    }

    /// Look up a user by email (case-insensitive).
    pub fn find_by_email(&self, email: &str) -> StoreResult<Option<StoredUser>> {
        let key = email_key(email);
        let read_txn = self.store.db().begin_read()?;
        let index = read_txn.open_table(USER_EMAIL_INDEX)?;
        let Some(id) = index.get(key.as_str())?.map(|v| v.value()) else {
            return Ok(None);
        };

        let users = read_txn.open_table(USERS)?;
        match users.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Replace a user's password hash.
    pub fn update_password(&self, id: u64, password_hash: String) -> StoreResult<StoredUser> {
        let write_txn = self.store.db().begin_write()?;
        let user = {
            let mut table = write_txn.open_table(USERS)?;

            let existing_bytes = {
                let existing = table
                    .get(id)?
                    .ok_or_else(|| StoreError::NotFound(format!("User {id}")))?;
                existing.value().to_vec()
            };

            let mut user: StoredUser = serde_json::from_slice(&existing_bytes)?;
            user.password_hash = password_hash;
            user.updated_at = Utc::now();

            let json = serde_json::to_vec(&user)?;
            table.insert(id, json.as_slice())?;
            user
        };
        write_txn.commit()?;
        Ok(user)
    }
}

impl UserDirectory for Store {
    fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, DirectoryError> {
        UserRepository::new(self)
            .find_by_email(email)
            .map(|user| user.as_ref().map(UserRecord::from))
            .map_err(|e| DirectoryError(e.to_string()))
    }

    fn find_by_id(&self, id: u64) -> Result<Option<UserRecord>, DirectoryError> {
        UserRepository::new(self)
            .find(id)
            .map(|user| user.as_ref().map(UserRecord::from))
            .map_err(|e| DirectoryError(e.to_string()))
    }
}
