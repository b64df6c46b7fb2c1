// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Issue repository.
//!
//! Deleting an issue also deletes its replies in the same transaction.

use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::db::{
    next_id, Store, StoreError, StoreResult, ISSUES, ISSUE_REPLY_INDEX, REPLIES,
};
use super::super::OwnedResource;

/// Maximum length of an issue title.
pub const MAX_TITLE_LENGTH: usize = 100;

/// Maximum length of an issue or reply body.
pub const MAX_BODY_LENGTH: usize = 2000;

/// Issue lifecycle status. Travels as `"1"` (open) / `"0"` (closed).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub enum IssueStatus {
    #[serde(rename = "1")]
    Open,
    #[serde(rename = "0")]
    Closed,
}

/// Issue severity. Travels as `"1"` (low) / `"2"` (medium) / `"3"` (high).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub enum Severity {
    #[serde(rename = "1")]
    Low,
    #[serde(rename = "2")]
    Medium,
    #[serde(rename = "3")]
    High,
}

/// Issue as persisted.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StoredIssue {
    pub id: u64,
    /// Reporter; fixed at creation
    pub user_id: u64,
    pub title: String,
    pub body: String,
    pub status: IssueStatus,
    pub severity: Severity,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by_user_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by_user_name: Option<String>,
}

impl OwnedResource for StoredIssue {
    const KIND: &'static str = "Issue";

    fn owner_user_id(&self) -> u64 {
        self.user_id
    }
}

/// Fields needed to file an issue. New issues start open.
#[derive(Debug, Clone)]
pub struct NewIssue {
    pub user_id: u64,
    pub title: String,
    pub body: String,
    pub severity: Severity,
}

/// Editable issue fields plus who made the edit.
#[derive(Debug, Clone)]
pub struct IssueChanges {
    pub title: String,
    pub body: String,
    pub status: IssueStatus,
    pub severity: Severity,
    pub updated_by_user_id: u64,
    pub updated_by_user_name: String,
}

/// Repository for issue operations.
pub struct IssueRepository<'a> {
    store: &'a Store,
}

impl<'a> IssueRepository<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    pub fn create(&self, new_issue: NewIssue) -> StoreResult<StoredIssue> {
        let now = Utc::now();

        let write_txn = self.store.db().begin_write()?;
        let issue = {
            let id = next_id(&write_txn, "issues")?;
            let issue = StoredIssue {
                id,
                user_id: new_issue.user_id,
                title: new_issue.title,
                body: new_issue.body,
                status: IssueStatus::Open,
                severity: new_issue.severity,
                created_at: now,
                updated_at: now,
                updated_by_user_id: None,
                updated_by_user_name: None,
            };

            let json = serde_json::to_vec(&issue)?;
            let mut table = write_txn.open_table(ISSUES)?;
            table.insert(id, json.as_slice())?;
            issue
        };
        write_txn.commit()?;

        Ok(issue)
    }

    pub fn find(&self, id: u64) -> StoreResult<Option<StoredIssue>> {
        let read_txn = self.store.db().begin_read()?;
        let table = read_txn.open_table(ISSUES)?;
        match table.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn exists(&self, id: u64) -> StoreResult<bool> {
        let read_txn = self.store.db().begin_read()?;
        let table = read_txn.open_table(ISSUES)?;
        Ok(table.get(id)?.is_some())
    }

    /// All issues, oldest first.
    pub fn list(&self) -> StoreResult<Vec<StoredIssue>> {
        let read_txn = self.store.db().begin_read()?;
        let table = read_txn.open_table(ISSUES)?;

        let mut issues = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            issues.push(serde_json::from_slice(value.value())?);
        }
        Ok(issues)
    }

    /// Apply edits to an existing issue.
    pub fn update(&self, id: u64, changes: IssueChanges) -> StoreResult<StoredIssue> {
        let write_txn = self.store.db().begin_write()?;
        let issue = {
            let mut table = write_txn.open_table(ISSUES)?;

            let existing_bytes = {
                let existing = table
                    .get(id)?
                    .ok_or_else(|| StoreError::NotFound(format!("Issue {id}")))?;
                existing.value().to_vec()
            };

            let mut issue: StoredIssue = serde_json::from_slice(&existing_bytes)?;
            issue.title = changes.title;
            issue.body = changes.body;
            issue.status = changes.status;
            issue.severity = changes.severity;
            issue.updated_by_user_id = Some(changes.updated_by_user_id);
            issue.updated_by_user_name = Some(changes.updated_by_user_name);
            issue.updated_at = Utc::now();

            let json = serde_json::to_vec(&issue)?;
            table.insert(id, json.as_slice())?;
            issue
        };
        write_txn.commit()?;
        Ok(issue)
    }

    /// Delete an issue and all of its replies.
    ///
    /// Returns the number of replies removed.
    pub fn delete(&self, id: u64) -> StoreResult<usize> {
        let write_txn = self.store.db().begin_write()?;
        let removed_replies = {
            let mut issues = write_txn.open_table(ISSUES)?;
            if issues.remove(id)?.is_none() {
                return Err(StoreError::NotFound(format!("Issue {id}")));
            }

            let mut index = write_txn.open_table(ISSUE_REPLY_INDEX)?;
            let mut keys = Vec::new();
            for entry in index.range((id, 0u64)..=(id, u64::MAX))? {
                let (key, _) = entry?;
                keys.push(key.value());
            }

            let mut replies = write_txn.open_table(REPLIES)?;
            for (issue_id, reply_id) in &keys {
                index.remove((*issue_id, *reply_id))?;
                replies.remove(*reply_id)?;
            }
            keys.len()
        };
        write_txn.commit()?;
        Ok(removed_replies)
    }
}
