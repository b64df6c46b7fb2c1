// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Password hashing with bcrypt.
//!
//! Hashing and verification are CPU-bound and run on tokio's blocking pool.

use bcrypt::{hash, verify, DEFAULT_COST};

/// Bcrypt cost used when none is configured.
pub const BCRYPT_COST: u32 = DEFAULT_COST;

/// Bcrypt only looks at the first 72 bytes.
pub const MAX_PASSWORD_LENGTH: usize = 72;

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("Password must not be empty")]
    Empty,

    #[error("Password must be at most {MAX_PASSWORD_LENGTH} bytes")]
    TooLong,

    #[error("password hashing failed: {0}")]
    Hashing(String),
}

/// Reject passwords bcrypt cannot handle faithfully.
pub fn validate_password(password: &str) -> Result<(), PasswordError> {
    if password.is_empty() {
        return Err(PasswordError::Empty);
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(PasswordError::TooLong);
    }
    Ok(())
}

/// Hash a password.
pub async fn hash_password(password: &str, cost: u32) -> Result<String, PasswordError> {
    validate_password(password)?;
    let password = password.to_string();

    tokio::task::spawn_blocking(move || {
        hash(password, cost).map_err(|e| PasswordError::Hashing(e.to_string()))
    })
    .await
    .map_err(|e| PasswordError::Hashing(format!("Task join error: {e}")))?
}

/// Check a password against a stored hash. `Ok(false)` means mismatch.
pub async fn verify_password(password: &str, password_hash: &str) -> Result<bool, PasswordError> {
    let password = password.to_string();
    let password_hash = password_hash.to_string();

    tokio::task::spawn_blocking(move || {
        verify(password, &password_hash).map_err(|e| PasswordError::Hashing(e.to_string()))
    })
    .await
    .map_err(|e| PasswordError::Hashing(format!("Task join error: {e}")))?
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_COST: u32 = 4;

    #[tokio::test]
    async fn hash_then_verify() {
        let hashed = hash_password("correct horse", TEST_COST).await.unwrap();
        assert_ne!(hashed, "correct horse");
        assert!(verify_password("correct horse", &hashed).await.unwrap());
        assert!(!verify_password("battery staple", &hashed).await.unwrap());
    }

    #[tokio::test]
    async fn hashes_are_salted() {
        let a = hash_password("same", TEST_COST).await.unwrap();
        let b = hash_password("same", TEST_COST).await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn rejects_unusable_passwords() {
        assert!(matches!(
            hash_password("", TEST_COST).await,
            Err(PasswordError::Empty)
        ));
        let long = "x".repeat(MAX_PASSWORD_LENGTH + 1);
        assert!(matches!(
            hash_password(&long, TEST_COST).await,
            Err(PasswordError::TooLong)
        ));
    }

    #[tokio::test]
    async fn garbage_hash_is_an_error() {
        assert!(verify_password("pw", "not-a-bcrypt-hash").await.is_err());
    }
}
