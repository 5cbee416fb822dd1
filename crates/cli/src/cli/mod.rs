// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

mod args;

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use outbox_core::{EntityKind, Operation};
use serde_json::Value;

pub use args::OutputArgs;
use args::{json_value, non_empty_string, timestamp};

/// Output format for commands supporting structured output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "outbox")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Offline-first mutation queue and draft store")]
#[command(
    long_about = "Offline-first mutation queue and draft store.\n\n\
    Writes are queued durably and replayed against a REST backend once it is reachable."
)]
pub struct Cli {
    /// Config file (default: $OUTBOX_CONFIG, then the platform config dir)
    #[arg(long, global = true, value_name = "path")]
    pub config: Option<PathBuf>,

    /// Database file, overriding [store] path
    #[arg(long, global = true, value_name = "path")]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Queue a mutation for the remote
    #[command(after_help = "\
Examples:
  outbox enqueue work_order insert '{\"title\":\"Fix boiler\"}'
  outbox enqueue customer update '{\"id\":\"cu-1\",\"phone\":\"555-0100\"}'
  outbox enqueue invoice delete '{\"id\":\"inv-9\"}' --id offline-1")]
    Enqueue {
        /// Entity kind (work_order, customer, property, invoice, form_submission)
        kind: EntityKind,

        /// Operation (insert, update, delete)
        operation: Operation,

        /// JSON payload; update and delete need an "id" field
        #[arg(value_parser = json_value, default_value = "{}")]
        payload: Value,

        /// Queue id (default: generated)
        #[arg(long, value_parser = non_empty_string)]
        id: Option<String>,
    },

    /// Apply every queued mutation once
    Replay {
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Show queue and draft status
    Status {
        #[command(flatten)]
        output: OutputArgs,
    },

    /// List queued mutations
    Pending {
        /// Only show this entity kind
        #[arg(long, short)]
        kind: Option<EntityKind>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Drop one queued mutation
    Remove {
        /// Queue id
        id: String,
    },

    /// Drop every queued mutation
    Clear {
        /// Required: the queue is discarded without being applied
        #[arg(long)]
        force: bool,
    },

    /// Manage local drafts
    #[command(subcommand)]
    Draft(DraftCommand),

    /// Replay in the background until interrupted
    Watch,
}

#[derive(Subcommand)]
pub enum DraftCommand {
    /// Save a local draft
    #[command(after_help = "\
Examples:
  outbox draft save wo-1 '{\"notes\":\"half done\"}' --owner u-1 --template work_order
  outbox draft save wo-1 '{\"status\":\"done\"}' --owner u-1 --template work_order --sync update")]
    Save {
        /// Draft id (use "pending" before the entity exists remotely)
        #[arg(value_parser = non_empty_string)]
        id: String,

        /// Draft state as JSON
        #[arg(value_parser = json_value)]
        state: Value,

        /// Owning user id
        #[arg(long, value_parser = non_empty_string)]
        owner: String,

        /// Form template or entity kind
        #[arg(long, value_parser = non_empty_string)]
        template: String,

        /// Last edit time (RFC 3339 or epoch ms; default: now)
        #[arg(long, value_parser = timestamp)]
        updated_at: Option<DateTime<Utc>>,

        /// Also queue this operation for the entity named by --template
        #[arg(long, value_name = "OPERATION")]
        sync: Option<Operation>,
    },

    /// Show a local draft
    Show {
        id: String,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// List drafts not yet confirmed by the remote
    List {
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Mark a draft as confirmed by the remote
    MarkSynced { id: String },

    /// Delete a local draft
    Delete { id: String },

    /// Check whether a draft should be offered for recovery
    Check {
        id: String,

        /// Remote record's last-modified time (omit if the record does not exist)
        #[arg(long, value_parser = timestamp)]
        remote_updated_at: Option<DateTime<Utc>>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Restore or discard a recoverable draft
    Resolve {
        id: String,

        /// What to do with the local draft
        #[arg(value_enum)]
        choice: RecoveryArg,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum RecoveryArg {
    Restore,
    Discard,
}

#[cfg(test)]
#[path = "../cli_tests.rs"]
mod tests;
