// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Queued writes and their typed shapes.
//!
//! A [`PendingMutation`] is what the durable queue persists: an opaque JSON
//! payload plus retry bookkeeping. A [`Mutation`] is the typed form that the
//! replay path applies; parsing one out of a queued payload is where a
//! missing record id is caught.

use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::entity::EntityKind;
use crate::error::{Error, Result};

/// Retry ceiling applied at enqueue time unless configured otherwise.
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Length of the random suffix in generated sync ids.
const SYNC_ID_SUFFIX_LEN: usize = 9;

/// The kind of write a mutation performs against the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Insert,
    Update,
    Delete,
}

impl Operation {
    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Insert => "insert",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Operation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "insert" | "create" => Ok(Operation::Insert),
            "update" => Ok(Operation::Update),
            "delete" => Ok(Operation::Delete),
            _ => Err(Error::InvalidOperation(s.to_string())),
        }
    }
}

/// Identifier of a record in the remote store. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(Error::InvalidPayload("record id cannot be empty".into()));
        }
        Ok(RecordId(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RecordId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        RecordId::new(value)
    }
}

impl From<RecordId> for String {
    fn from(id: RecordId) -> Self {
        id.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A typed write against one remote record.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Create a record from the given fields.
    Insert { record: Map<String, Value> },
    /// Overwrite the given fields of an existing record.
    Update {
        id: RecordId,
        changes: Map<String, Value>,
    },
    /// Remove an existing record.
    Delete { id: RecordId },
}

impl Mutation {
    pub fn operation(&self) -> Operation {
        match self {
            Mutation::Insert { .. } => Operation::Insert,
            Mutation::Update { .. } => Operation::Update,
            Mutation::Delete { .. } => Operation::Delete,
        }
    }

    /// Parses an untyped queued payload for the given operation.
    ///
    /// `Update` and `Delete` require an `id` field (string or number).
    pub fn from_payload(operation: Operation, payload: &Value) -> Result<Self> {
        let fields = payload.as_object().ok_or_else(|| {
            Error::InvalidPayload(format!("{operation} payload must be a JSON object"))
        })?;

        match operation {
            Operation::Insert => Ok(Mutation::Insert {
                record: fields.clone(),
            }),
            Operation::Update => {
                let id = record_id(operation, fields)?;
                let mut changes = fields.clone();
                changes.remove("id");
                Ok(Mutation::Update { id, changes })
            }
            Operation::Delete => Ok(Mutation::Delete {
                id: record_id(operation, fields)?,
            }),
        }
    }

    /// Flattens the mutation back into the untyped queue representation.
    pub fn to_payload(&self) -> Value {
        match self {
            Mutation::Insert { record } => Value::Object(record.clone()),
            Mutation::Update { id, changes } => {
                let mut fields = changes.clone();
                fields.insert("id".into(), Value::String(id.to_string()));
                Value::Object(fields)
            }
            Mutation::Delete { id } => {
                let mut fields = Map::new();
                fields.insert("id".into(), Value::String(id.to_string()));
                Value::Object(fields)
            }
        }
    }
}

fn record_id(operation: Operation, fields: &Map<String, Value>) -> Result<RecordId> {
    let id = match fields.get("id") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return Err(Error::MissingRecordId { operation }),
    };
    RecordId::new(id).map_err(|_| Error::MissingRecordId { operation })
}

/// Links a queued mutation to the local draft it was produced from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftLink {
    pub id: String,
    /// The draft's `updated_at` when the mutation was enqueued.
    pub updated_at: DateTime<Utc>,
}

/// A queued, not-yet-applied write for the remote system of record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingMutation {
    pub id: String,
    pub entity_kind: EntityKind,
    pub operation: Operation,
    pub payload: Value,
    pub enqueued_at: DateTime<Utc>,
    pub retry_count: u32,
    pub max_retries: u32,
    pub last_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draft: Option<DraftLink>,
}

impl PendingMutation {
    /// Creates a fresh mutation with no failed attempts.
    pub fn new(
        id: String,
        entity_kind: EntityKind,
        operation: Operation,
        payload: Value,
        enqueued_at: DateTime<Utc>,
        max_retries: u32,
    ) -> Self {
        PendingMutation {
            id,
            entity_kind,
            operation,
            payload,
            enqueued_at,
            retry_count: 0,
            max_retries,
            last_error: None,
            draft: None,
        }
    }

    pub fn with_draft(mut self, link: DraftLink) -> Self {
        self.draft = Some(link);
        self
    }

    /// Parses the queued payload into its typed form.
    pub fn mutation(&self) -> Result<Mutation> {
        Mutation::from_payload(self.operation, &self.payload)
    }

    /// Records one failed apply attempt.
    pub fn record_failure(&mut self, error: impl Into<String>) {
        self.retry_count = self.retry_count.saturating_add(1);
        self.last_error = Some(error.into());
    }

    /// Records a failure that must not be retried, consuming the whole budget.
    pub fn record_permanent_failure(&mut self, error: impl Into<String>) {
        self.retry_count = self.retry_count.max(self.max_retries);
        self.last_error = Some(error.into());
    }

    /// Returns true once the retry budget is spent.
    pub fn is_exhausted(&self) -> bool {
        self.retry_count >= self.max_retries
    }
}

/// Generates a queue id of the form `sync-<epoch_ms>-<random>`.
pub fn generate_sync_id(now_ms: i64) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SYNC_ID_SUFFIX_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();
    format!("sync-{now_ms}-{suffix}")
}

#[cfg(test)]
#[path = "mutation_tests.rs"]
mod tests;
