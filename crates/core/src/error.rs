// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for outbox-core operations.

use thiserror::Error;

use crate::mutation::Operation;

/// All possible errors that can occur in outbox-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("invalid entity kind: '{0}'\n  hint: valid kinds are: work_order, customer, property, invoice, form_submission")]
    InvalidEntityKind(String),

    #[error("invalid operation: '{0}'\n  hint: valid operations are: insert, update, delete")]
    InvalidOperation(String),

    #[error("{operation} payload is missing the target record id")]
    MissingRecordId { operation: Operation },

    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupted data: {0}")]
    CorruptedData(String),

    #[error("pending mutation already queued: {0}\n  hint: remove it first or enqueue without an explicit id")]
    DuplicateMutationId(String),

    #[error("no draft store is attached")]
    DraftStoreDetached,
}

impl Error {
    /// Returns true for errors that no amount of retrying will fix.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::MissingRecordId { .. }
                | Error::InvalidPayload(_)
                | Error::InvalidEntityKind(_)
                | Error::InvalidOperation(_)
        )
    }

    /// Returns true when the backing store could not be read or written.
    pub fn is_storage_unavailable(&self) -> bool {
        matches!(self, Error::StorageUnavailable(_))
    }
}

impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Self {
        match e {
            rusqlite::Error::FromSqlConversionFailure(_, _, inner) => {
                Error::CorruptedData(inner.to_string())
            }
            other => Error::StorageUnavailable(other.to_string()),
        }
    }
}

/// A specialized Result type for outbox-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
