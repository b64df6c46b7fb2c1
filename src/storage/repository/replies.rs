// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Reply repository. Replies hang off an issue via the `(issue_id, reply_id)`
//! index so listing is a single range scan.

use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::db::{next_id, Store, StoreError, StoreResult, ISSUES, ISSUE_REPLY_INDEX, REPLIES};
use super::super::OwnedResource;

/// Reply as persisted.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StoredReply {
    pub id: u64,
    pub issue_id: u64,
    /// Author; fixed at creation
    pub user_id: u64,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OwnedResource for StoredReply {
    const KIND: &'static str = "Reply";

    fn owner_user_id(&self) -> u64 {
        self.user_id
    }
}

/// Repository for reply operations.
pub struct ReplyRepository<'a> {
    store: &'a Store,
}

impl<'a> ReplyRepository<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Add a reply to an issue. Fails with `NotFound` if the issue is gone.
    pub fn create(&self, issue_id: u64, user_id: u64, body: String) -> StoreResult<StoredReply> {
        let now = Utc::now();

        let write_txn = self.store.db().begin_write()?;
        let reply = {
            let issues = write_txn.open_table(ISSUES)?;
            if issues.get(issue_id)?.is_none() {
                return Err(StoreError::NotFound(format!("Issue {issue_id}")));
            }

            let id = next_id(&write_txn, "replies")?;
            let reply = StoredReply {
                id,
                issue_id,
                user_id,
                body,
                created_at: now,
                updated_at: now,
            };

            let json = serde_json::to_vec(&reply)?;
            let mut replies = write_txn.open_table(REPLIES)?;
            replies.insert(id, json.as_slice())?;
            let mut index = write_txn.open_table(ISSUE_REPLY_INDEX)?;
            index.insert((issue_id, id), ())?;
            reply
        };
        write_txn.commit()?;

        Ok(reply)
    }

    pub fn find(&self, id: u64) -> StoreResult<Option<StoredReply>> {
        let read_txn = self.store.db().begin_read()?;
        let table = read_txn.open_table(REPLIES)?;
        match table.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Find a reply only if it belongs to `issue_id`.
    pub fn find_in_issue(&self, issue_id: u64, id: u64) -> StoreResult<Option<StoredReply>> {
        Ok(self.find(id)?.filter(|reply| reply.issue_id == issue_id))
    }

    /// Replies to an issue, oldest first.
    pub fn list_by_issue(&self, issue_id: u64) -> StoreResult<Vec<StoredReply>> {
        let read_txn = self.store.db().begin_read()?;
        let index = read_txn.open_table(ISSUE_REPLY_INDEX)?;
        let table = read_txn.open_table(REPLIES)?;

        let mut replies = Vec::new();
        for entry in index.range((issue_id, 0u64)..=(issue_id, u64::MAX))? {
            let (key, _) = entry?;
            let (_, reply_id) = key.value();
            if let Some(value) = table.get(reply_id)? {
                replies.push(serde_json::from_slice(value.value())?);
            }
        }
        Ok(replies)
    }

    pub fn update(&self, id: u64, body: String) -> StoreResult<StoredReply> {
        let write_txn = self.store.db().begin_write()?;
        let reply = {
            let mut table = write_txn.open_table(REPLIES)?;

            let existing_bytes = {
                let existing = table
                    .get(id)?
                    .ok_or_else(|| StoreError::NotFound(format!("Reply {id}")))?;
                existing.value().to_vec()
            };

            let mut reply: StoredReply = serde_json::from_slice(&existing_bytes)?;
            reply.body = body;
            reply.updated_at = Utc::now();

            let json = serde_json::to_vec(&reply)?;
            table.insert(id, json.as_slice())?;
            reply
        };
        write_txn.commit()?;
        Ok(reply)
    }

    pub fn delete(&self, id: u64) -> StoreResult<()> {
        let write_txn = self.store.db().begin_write()?;
        {
            let mut table = write_txn.open_table(REPLIES)?;
            let issue_id = {
                let existing = table
                    .get(id)?
                    .ok_or_else(|| StoreError::NotFound(format!("Reply {id}")))?;
                let reply: StoredReply = serde_json::from_slice(existing.value())?;
                reply.issue_id
            };
            table.remove(id)?;

            let mut index = write_txn.open_table(ISSUE_REPLY_INDEX)?;
            index.remove((issue_id, id))?;
        }
        write_txn.commit()?;
        Ok(())
    }
}
