// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Stateless token authentication and request authorization for the issue
//! tracker API.
//!
//! ## Auth Flow
//!
//! 1. Client logs in with email and password and receives a signed token
//! 2. Client sends the token in the `token` header (or `Authorization: Bearer`)
//! 3. Server:
//!    - Verifies the HS256 signature with the shared secret
//!    - Checks issuer and expiry
//!    - Resolves the email against the user directory, so deleted users and
//!      role changes take effect immediately
//! 4. Handlers apply [`RoleGate`] before parsing input and [`OwnershipGate`]
//!    after fetching the target resource
//!
//! ## Security
//!
//! - All `/v1/protected` endpoints require authentication
//! - Signature, expiry and issuer failures are indistinguishable to clients
//! - Passwords are hashed with bcrypt and never leave the server

pub mod claims;
pub mod codec;
pub mod directory;
pub mod error;
pub mod extractor;
pub mod gates;
pub mod middleware;
pub mod password;
pub mod roles;
pub mod validator;

pub use claims::{CallerIdentity, IdentityClaim};
pub use codec::TokenCodec;
pub use directory::{DirectoryError, UserDirectory, UserRecord};
pub use error::AuthError;
pub use extractor::{Auth, QaOnly, RequireRole};
pub use gates::{Decision, OwnershipGate, RoleGate};
pub use password::{hash_password, verify_password, PasswordError};
pub use roles::Role;
pub use validator::{AuthValidator, Clock, SystemClock, TokenSettings};
