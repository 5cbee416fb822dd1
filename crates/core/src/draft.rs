// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Local draft store for in-progress entity edits.
//!
//! Drafts are saved on every local edit regardless of connectivity, so the
//! write path only fails when the local database itself is unusable.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::clock::{from_millis, truncate_millis};
use crate::db::{self, DRAFT_MIGRATIONS};
use crate::error::{Error, Result};

/// Migration key for this store in `schema_versions`.
const STORE_NAME: &str = "drafts";

/// Placeholder id for a draft whose entity the remote store does not know yet.
pub const PENDING_DRAFT_ID: &str = "pending";

/// The latest local snapshot of an in-progress entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalDraftRecord {
    pub id: String,
    /// Field values plus auxiliary metadata (signature, display preferences).
    pub state: Value,
    /// False while only the local copy reflects the latest edit.
    pub synced: bool,
    pub updated_at: DateTime<Utc>,
    pub owner_user_id: String,
    /// Form template or entity kind used to route the eventual remote write.
    pub template: String,
}

impl LocalDraftRecord {
    /// Creates an unsynced draft. `updated_at` is truncated to milliseconds.
    pub fn new(
        id: impl Into<String>,
        state: Value,
        updated_at: DateTime<Utc>,
        owner_user_id: impl Into<String>,
        template: impl Into<String>,
    ) -> Self {
        LocalDraftRecord {
            id: id.into(),
            state,
            synced: false,
            updated_at: truncate_millis(updated_at),
            owner_user_id: owner_user_id.into(),
            template: template.into(),
        }
    }
}

/// SQLite-backed store of [`LocalDraftRecord`]s keyed by id.
pub struct DraftStore {
    conn: Mutex<Connection>,
}

impl DraftStore {
    /// Opens (or creates) the draft store in the database file at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        Self::from_connection(db::open(path)?)
    }

    /// Opens a draft store backed by a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(db::open_in_memory()?)
    }

    fn from_connection(mut conn: Connection) -> Result<Self> {
        db::migrate(&mut conn, STORE_NAME, DRAFT_MIGRATIONS)?;
        Ok(DraftStore {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::StorageUnavailable("draft store lock poisoned".into()))
    }

    /// Upserts a draft by id.
    pub fn save_local(&self, draft: &LocalDraftRecord) -> Result<()> {
        let state = serde_json::to_string(&draft.state)?;
        self.conn()?.execute(
            "INSERT INTO local_drafts (id, state, synced, updated_at, owner_user_id, template)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(id) DO UPDATE SET
                 state = excluded.state,
                 synced = excluded.synced,
                 updated_at = excluded.updated_at,
                 owner_user_id = excluded.owner_user_id,
                 template = excluded.template",
            params![
                draft.id,
                state,
                draft.synced,
                draft.updated_at.timestamp_millis(),
                draft.owner_user_id,
                draft.template,
            ],
        )?;
        Ok(())
    }

    pub fn load_local(&self, id: &str) -> Result<Option<LocalDraftRecord>> {
        let found = self
            .conn()?
            .query_row(
                "SELECT id, state, synced, updated_at, owner_user_id, template
                 FROM local_drafts WHERE id = ?1",
                params![id],
                row_to_draft,
            )
            .optional()?;
        Ok(found)
    }

    /// Marks a draft synced regardless of its timestamp.
    ///
    /// Returns false when the draft does not exist.
    pub fn mark_synced(&self, id: &str) -> Result<bool> {
        let affected = self.conn()?.execute(
            "UPDATE local_drafts SET synced = 1 WHERE id = ?1",
            params![id],
        )?;
        Ok(affected > 0)
    }

    /// Marks a draft synced only if no local edit happened after `as_of`.
    ///
    /// Returns false when the draft is missing or has been edited since.
    pub fn mark_synced_at(&self, id: &str, as_of: DateTime<Utc>) -> Result<bool> {
        let affected = self.conn()?.execute(
            "UPDATE local_drafts SET synced = 1 WHERE id = ?1 AND updated_at = ?2",
            params![id, as_of.timestamp_millis()],
        )?;
        Ok(affected > 0)
    }

    /// Returns false when the draft did not exist.
    pub fn delete_local(&self, id: &str) -> Result<bool> {
        let affected = self
            .conn()?
            .execute("DELETE FROM local_drafts WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }

    /// Unsynced drafts, oldest edit first.
    pub fn list_unsynced(&self) -> Result<Vec<LocalDraftRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, state, synced, updated_at, owner_user_id, template
             FROM local_drafts WHERE synced = 0 ORDER BY updated_at ASC, id ASC",
        )?;
        let rows = stmt.query_map([], row_to_draft)?;
        let mut drafts = Vec::new();
        for row in rows {
            drafts.push(row?);
        }
        Ok(drafts)
    }
}

fn row_to_draft(row: &Row<'_>) -> std::result::Result<LocalDraftRecord, rusqlite::Error> {
    let state: String = row.get(1)?;
    let state = serde_json::from_str(&state).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(LocalDraftRecord {
        id: row.get(0)?,
        state,
        synced: row.get(2)?,
        updated_at: from_millis(row.get(3)?),
        owner_user_id: row.get(4)?,
        template: row.get(5)?,
    })
}

#[cfg(test)]
#[path = "draft_tests.rs"]
mod tests;
