// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access.
//!
//! All runtime environment variables read by the CLI are named here with
//! typed accessor functions.

use std::path::PathBuf;

/// Environment variable names.
pub mod vars {
    /// Path to the config file, overridden by `--config`.
    pub const OUTBOX_CONFIG: &str = "OUTBOX_CONFIG";
    /// Log filter directives for `tracing-subscriber`.
    pub const OUTBOX_LOG: &str = "OUTBOX_LOG";
    /// Default name of the variable holding the remote API key.
    pub const OUTBOX_API_KEY: &str = "OUTBOX_API_KEY";
}

/// Returns the value of `OUTBOX_CONFIG` if set and non-empty.
pub fn config_path() -> Option<PathBuf> {
    non_empty(vars::OUTBOX_CONFIG).map(PathBuf::from)
}

/// Returns the value of `OUTBOX_LOG` if set and non-empty.
pub fn log_filter() -> Option<String> {
    non_empty(vars::OUTBOX_LOG)
}

/// Returns the value of the named variable if set and non-empty.
pub fn secret(name: &str) -> Option<String> {
    non_empty(name)
}

fn non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
