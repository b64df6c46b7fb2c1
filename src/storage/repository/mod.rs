// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Repository layer providing typed access to the embedded database.
//!
//! Each repository provides CRUD operations for a specific entity type and
//! runs every mutation in a single redb write transaction.

pub mod issues;
pub mod replies;
pub mod users;

pub use issues::{
    IssueChanges, IssueRepository, IssueStatus, NewIssue, Severity, StoredIssue,
    MAX_BODY_LENGTH, MAX_TITLE_LENGTH,
};
pub use replies::{ReplyRepository, StoredReply};
pub use users::{NewUser, StoredUser, UserRepository, MAX_EMAIL_LENGTH, MAX_NAME_LENGTH};
