// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Persistent storage for users, issues and replies in a single redb file
//! under the configured data directory.
//!
//! ## Storage Layout
//!
//! ```text
//! {DATA_DIR}/
//!   issue-tracker.redb   # users, issues, replies, indexes, id sequences
//! ```
//!
//! ## Important Notes
//!
//! - Password hashes are stored but never serialized into API responses
//! - Ids are allocated per entity and never reused
//! - Ownership is checked after a fetch, see [`ownership`]

pub mod db;
pub mod ownership;
pub mod repository;

pub use db::{Store, StoreError, StoreResult, DB_FILE_NAME};
pub use ownership::{OwnedResource, OwnershipCheck, OwnershipEnforcer};
pub use repository::{
    IssueChanges, IssueRepository, IssueStatus, NewIssue, NewUser, ReplyRepository, Severity,
    StoredIssue, StoredReply, StoredUser, UserRepository,
};
