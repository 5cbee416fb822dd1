// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared argument structs and value parsers for CLI commands.

use chrono::{DateTime, Utc};
use clap::Args;
use outbox_core::{from_millis, truncate_millis};
use serde_json::Value;

use super::OutputFormat;

/// Output format argument shared by commands that print data.
#[derive(Args, Clone, Copy, Debug, Default)]
pub struct OutputArgs {
    /// Output format
    #[arg(long, short, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,
}

/// Parse a string that must not be empty or whitespace-only.
pub(crate) fn non_empty_string(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        Err("cannot be empty".to_string())
    } else {
        Ok(s.to_string())
    }
}

/// Parse a JSON document.
pub(crate) fn json_value(s: &str) -> Result<Value, String> {
    serde_json::from_str(s).map_err(|e| format!("invalid JSON: {e}"))
}

/// Parse an RFC 3339 timestamp or integer epoch milliseconds.
///
/// Sub-millisecond digits are dropped.
pub(crate) fn timestamp(s: &str) -> Result<DateTime<Utc>, String> {
    let s = s.trim();
    if let Ok(ms) = s.parse::<i64>() {
        return Ok(from_millis(ms));
    }
    DateTime::parse_from_rfc3339(s)
        .map(|dt| truncate_millis(dt.with_timezone(&Utc)))
        .map_err(|_| format!("expected RFC 3339 or epoch milliseconds, got '{s}'"))
}
