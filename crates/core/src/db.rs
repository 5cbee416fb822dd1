// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! SQLite connection setup and versioned schema migrations.
//!
//! Each store owns one logical table and its own migration list. Applied
//! versions are tracked per store in `schema_versions`, so adding an index or
//! column later is an additive step instead of a rebuild.

use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use crate::error::Result;

const SCHEMA_VERSIONS: &str = r#"
CREATE TABLE IF NOT EXISTS schema_versions (
    store TEXT PRIMARY KEY,
    version INTEGER NOT NULL
);
"#;

/// Migrations for the durable mutation queue, applied in order.
pub const QUEUE_MIGRATIONS: &[&str] = &[
    // 1: base table keyed by id, secondary index by entity kind
    r#"
    CREATE TABLE IF NOT EXISTS pending_mutations (
        id TEXT PRIMARY KEY,
        entity_kind TEXT NOT NULL,
        operation TEXT NOT NULL,
        payload TEXT NOT NULL,
        enqueued_at INTEGER NOT NULL,
        retry_count INTEGER NOT NULL DEFAULT 0,
        max_retries INTEGER NOT NULL,
        last_error TEXT
    );
    CREATE INDEX IF NOT EXISTS idx_pending_entity_kind ON pending_mutations(entity_kind);
    "#,
    // 2: sortable index for causal replay order
    r#"
    CREATE INDEX IF NOT EXISTS idx_pending_enqueued_at ON pending_mutations(enqueued_at);
    "#,
    // 3: link back to the local draft the mutation was produced from
    r#"
    ALTER TABLE pending_mutations ADD COLUMN draft_id TEXT;
    ALTER TABLE pending_mutations ADD COLUMN draft_updated_at INTEGER;
    "#,
];

/// Migrations for the local draft store, applied in order.
pub const DRAFT_MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS local_drafts (
        id TEXT PRIMARY KEY,
        state TEXT NOT NULL,
        synced INTEGER NOT NULL DEFAULT 0,
        updated_at INTEGER NOT NULL,
        owner_user_id TEXT NOT NULL,
        template TEXT NOT NULL
    );
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_drafts_synced ON local_drafts(synced, updated_at);
    "#,
];

/// Opens a database file, creating parent directories as needed.
pub fn open(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let conn = Connection::open(path)?;
    configure(&conn)?;
    Ok(conn)
}

/// Opens a private in-memory database.
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    configure(&conn)?;
    Ok(conn)
}

fn configure(conn: &Connection) -> Result<()> {
    conn.busy_timeout(std::time::Duration::from_secs(5))?;
    // WAL is unavailable for in-memory databases; SQLite silently keeps "memory".
    conn.query_row("PRAGMA journal_mode = WAL", [], |_| Ok(()))?;
    Ok(())
}

/// Returns the migration version recorded for a store (0 when never migrated).
pub fn schema_version(conn: &Connection, store: &str) -> Result<usize> {
    conn.execute_batch(SCHEMA_VERSIONS)?;
    let version: Option<i64> = conn
        .query_row(
            "SELECT version FROM schema_versions WHERE store = ?1",
            params![store],
            |row| row.get(0),
        )
        .optional()?;
    Ok(version.unwrap_or(0).max(0) as usize)
}

/// Applies every migration for `store` newer than its recorded version.
///
/// Each step runs in its own transaction together with the version bump.
pub fn migrate(conn: &mut Connection, store: &str, migrations: &[&str]) -> Result<usize> {
    let current = schema_version(conn, store)?;

    for (index, sql) in migrations.iter().enumerate().skip(current) {
        let tx = conn.transaction()?;
        tx.execute_batch(sql)?;
        tx.execute(
            "INSERT INTO schema_versions (store, version) VALUES (?1, ?2)
             ON CONFLICT(store) DO UPDATE SET version = excluded.version",
            params![store, (index + 1) as i64],
        )?;
        tx.commit()?;
    }

    Ok(migrations.len().max(current))
}

#[cfg(test)]
#[path = "db_tests.rs"]
mod tests;
