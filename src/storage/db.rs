// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `users`: user_id → serialized StoredUser
//! - `user_email_index`: lowercase email → user_id
//! - `issues`: issue_id → serialized StoredIssue
//! - `replies`: reply_id → serialized StoredReply
//! - `issue_reply_index`: (issue_id, reply_id) → ()
//! - `sequences`: entity name → last allocated id

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};

// =============================================================================
// Table Definitions
// =============================================================================

/// Primary table: user_id → serialized StoredUser (JSON bytes).
pub(crate) const USERS: TableDefinition<u64, &[u8]> = TableDefinition::new("users");

/// Unique index: lowercase email → user_id.
pub(crate) const USER_EMAIL_INDEX: TableDefinition<&str, u64> =
    TableDefinition::new("user_email_index");

/// Primary table: issue_id → serialized StoredIssue (JSON bytes).
pub(crate) const ISSUES: TableDefinition<u64, &[u8]> = TableDefinition::new("issues");

/// Primary table: reply_id → serialized StoredReply (JSON bytes).
pub(crate) const REPLIES: TableDefinition<u64, &[u8]> = TableDefinition::new("replies");

/// Index: (issue_id, reply_id) for per-issue range scans.
pub(crate) const ISSUE_REPLY_INDEX: TableDefinition<(u64, u64), ()> =
    TableDefinition::new("issue_reply_index");

/// Id sequences: entity name → last allocated id.
const SEQUENCES: TableDefinition<&str, u64> = TableDefinition::new("sequences");

/// File name of the database inside the data directory.
pub const DB_FILE_NAME: &str = "issue-tracker.redb";

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Store
// =============================================================================

/// Handle to the embedded database. Cheap to clone.
#[derive(Clone)]
pub struct Store {
    db: Arc<Database>,
}

impl Store {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(USERS)?;
            let _ = write_txn.open_table(USER_EMAIL_INDEX)?;
            let _ = write_txn.open_table(ISSUES)?;
            let _ = write_txn.open_table(REPLIES)?;
            let _ = write_txn.open_table(ISSUE_REPLY_INDEX)?;
            let _ = write_txn.open_table(SEQUENCES)?;
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Open the database file inside `data_dir`.
    pub fn open_in_dir(data_dir: &Path) -> StoreResult<Self> {
        Self::open(&data_dir.join(DB_FILE_NAME))
    }

    pub(crate) fn db(&self) -> &Database {
        &self.db
    }

    /// Verify a read transaction can be opened.
    pub fn health_check(&self) -> StoreResult<()> {
        let read_txn = self.db.begin_read()?;
        let _ = read_txn.open_table(SEQUENCES)?;
        Ok(())
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").finish_non_exhaustive()
    }
}

/// Allocate the next id for `sequence` inside an open write transaction.
///
/// Ids start at 1 and are never reused.
pub(crate) fn next_id(write_txn: &WriteTransaction, sequence: &str) -> StoreResult<u64> {
    let mut table = write_txn.open_table(SEQUENCES)?;
    let current = table.get(sequence)?.map(|v| v.value()).unwrap_or(0);
    let next = current + 1;
    table.insert(sequence, next)?;
    Ok(next)
}

// =============================================================================
// Tests
// =============================================================================
