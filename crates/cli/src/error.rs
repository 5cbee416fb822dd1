// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

use crate::sync::GatewayError;

/// All possible errors that can occur in the outbox CLI.
///
/// Errors provide user-friendly messages with hints for common issues.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] outbox_core::Error),

    #[error("remote error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("config error: {0}")]
    Config(String),

    #[error("no remote configured\n  hint: set [remote] url in {path}")]
    RemoteNotConfigured { path: String },

    #[error("draft not found: {0}")]
    DraftNotFound(String),

    #[error("pending mutation not found: {0}")]
    MutationNotFound(String),

    #[error("refusing to drop {count} pending mutation(s)\n  hint: pass --force to clear the queue")]
    ClearRequiresForce { count: usize },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns true when the local store could not be read or written.
    pub fn is_storage_unavailable(&self) -> bool {
        matches!(self, Error::Core(e) if e.is_storage_unavailable())
    }
}

/// A specialized Result type for outbox CLI operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
