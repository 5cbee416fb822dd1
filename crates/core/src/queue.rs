// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Durable queue of pending mutations.
//!
//! [`QueueStore`] keeps one row per [`PendingMutation`] in SQLite, keyed by
//! id, with secondary indexes on entity kind and enqueue time. Snapshots are
//! always returned in enqueue order so replay preserves causal order for
//! mutations that target the same record.

use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::clock::from_millis;
use crate::db::{self, QUEUE_MIGRATIONS};
use crate::entity::EntityKind;
use crate::error::{Error, Result};
use crate::mutation::{DraftLink, PendingMutation};

/// Migration key for this store in `schema_versions`.
const STORE_NAME: &str = "queue";

const SELECT_COLUMNS: &str = "id, entity_kind, operation, payload, enqueued_at, retry_count, \
     max_retries, last_error, draft_id, draft_updated_at";

/// Persistence seam for the mutation queue.
///
/// Implementations must return `get_all` and `get_all_by_entity_kind` in
/// ascending `enqueued_at` order, stable for ties.
pub trait MutationStore: Send + Sync {
    /// Inserts or replaces the record with the same id.
    fn put(&self, mutation: &PendingMutation) -> Result<()>;

    fn get(&self, id: &str) -> Result<Option<PendingMutation>>;

    fn get_all(&self) -> Result<Vec<PendingMutation>>;

    fn get_all_by_entity_kind(&self, kind: EntityKind) -> Result<Vec<PendingMutation>>;

    /// Removes a record. Returns false when no record had that id.
    fn delete(&self, id: &str) -> Result<bool>;

    fn count(&self) -> Result<usize>;

    /// Removes every record, returning how many were dropped.
    fn clear(&self) -> Result<usize>;
}

/// SQLite-backed [`MutationStore`].
pub struct QueueStore {
    conn: Mutex<Connection>,
}

impl QueueStore {
    /// Opens (or creates) the queue in the database file at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        Self::from_connection(db::open(path)?)
    }

    /// Opens a queue backed by a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(db::open_in_memory()?)
    }

    fn from_connection(mut conn: Connection) -> Result<Self> {
        db::migrate(&mut conn, STORE_NAME, QUEUE_MIGRATIONS)?;
        Ok(QueueStore {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::StorageUnavailable("queue store lock poisoned".into()))
    }

    fn query(&self, sql: &str, kind: Option<EntityKind>) -> Result<Vec<PendingMutation>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = match kind {
            Some(kind) => stmt.query_map(params![kind.as_str()], row_to_mutation)?,
            None => stmt.query_map([], row_to_mutation)?,
        };
        let mut mutations = Vec::new();
        for row in rows {
            mutations.push(row?);
        }
        Ok(mutations)
    }
}

impl MutationStore for QueueStore {
    fn put(&self, m: &PendingMutation) -> Result<()> {
        let payload = serde_json::to_string(&m.payload)?;
        let (draft_id, draft_updated_at) = match &m.draft {
            Some(link) => (Some(link.id.as_str()), Some(link.updated_at.timestamp_millis())),
            None => (None, None),
        };

        self.conn()?.execute(
            "INSERT INTO pending_mutations (id, entity_kind, operation, payload, enqueued_at,
                 retry_count, max_retries, last_error, draft_id, draft_updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(id) DO UPDATE SET
                 entity_kind = excluded.entity_kind,
                 operation = excluded.operation,
                 payload = excluded.payload,
                 enqueued_at = excluded.enqueued_at,
                 retry_count = excluded.retry_count,
                 max_retries = excluded.max_retries,
                 last_error = excluded.last_error,
                 draft_id = excluded.draft_id,
                 draft_updated_at = excluded.draft_updated_at",
            params![
                m.id,
                m.entity_kind.as_str(),
                m.operation.as_str(),
                payload,
                m.enqueued_at.timestamp_millis(),
                m.retry_count,
                m.max_retries,
                m.last_error,
                draft_id,
                draft_updated_at,
            ],
        )?;
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<PendingMutation>> {
        let conn = self.conn()?;
        let sql = format!("SELECT {SELECT_COLUMNS} FROM pending_mutations WHERE id = ?1");
        let found = conn
            .query_row(&sql, params![id], row_to_mutation)
            .optional()?;
        Ok(found)
    }

    fn get_all(&self) -> Result<Vec<PendingMutation>> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM pending_mutations ORDER BY enqueued_at ASC, rowid ASC"
        );
        self.query(&sql, None)
    }

    fn get_all_by_entity_kind(&self, kind: EntityKind) -> Result<Vec<PendingMutation>> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM pending_mutations WHERE entity_kind = ?1
             ORDER BY enqueued_at ASC, rowid ASC"
        );
        self.query(&sql, Some(kind))
    }

    fn delete(&self, id: &str) -> Result<bool> {
        let affected = self
            .conn()?
            .execute("DELETE FROM pending_mutations WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }

    fn count(&self) -> Result<usize> {
        let count: i64 =
            self.conn()?
                .query_row("SELECT COUNT(*) FROM pending_mutations", [], |row| row.get(0))?;
        Ok(count.max(0) as usize)
    }

    fn clear(&self) -> Result<usize> {
        let affected = self.conn()?.execute("DELETE FROM pending_mutations", [])?;
        Ok(affected)
    }
}

/// Parse a string value from the database, returning a rusqlite error on parse failure.
fn parse_db<T: std::str::FromStr>(
    value: &str,
    column: &str,
) -> std::result::Result<T, rusqlite::Error> {
    value.parse().map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            Box::new(Error::CorruptedData(format!(
                "invalid value '{value}' in column '{column}'"
            ))),
        )
    })
}

fn row_to_mutation(row: &Row<'_>) -> std::result::Result<PendingMutation, rusqlite::Error> {
    let kind: String = row.get(1)?;
    let operation: String = row.get(2)?;
    let payload: String = row.get(3)?;
    let payload = serde_json::from_str(&payload).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let draft_id: Option<String> = row.get(8)?;
    let draft_updated_at: Option<i64> = row.get(9)?;

    Ok(PendingMutation {
        id: row.get(0)?,
        entity_kind: parse_db(&kind, "entity_kind")?,
        operation: parse_db(&operation, "operation")?,
        payload,
        enqueued_at: from_millis(row.get(4)?),
        retry_count: row.get(5)?,
        max_retries: row.get(6)?,
        last_error: row.get(7)?,
        draft: draft_id.zip(draft_updated_at).map(|(id, at)| DraftLink {
            id,
            updated_at: from_millis(at),
        }),
    })
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
