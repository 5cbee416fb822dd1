// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! outbox - an offline-first sync engine for field-service data.
//!
//! Writes made while the device is offline are queued durably in SQLite and
//! replayed against a REST backend once it is reachable. Local drafts of
//! in-progress forms are kept alongside the queue and offered for recovery
//! when they are newer than the remote copy.
//!
//! # Main Components
//!
//! - [`sync::SyncManager`] - enqueue, replay, and query pending mutations
//! - [`sync::ConnectivityMonitor`] - online/offline state and reconnect trigger
//! - [`sync::start_periodic_check`] - fixed-interval replay while online
//! - [`sync::ConflictResolver`] - draft recovery decisions
//! - [`sync::RestGateway`] - applies mutations to the remote
//! - [`Config`] - store location, remote endpoint, and sync tuning
//!
//! ```rust,ignore
//! use outbox::sync::{RestGateway, SyncConfig, SyncManager};
//! use outbox_core::{EntityKind, Operation, QueueStore};
//!
//! let store = QueueStore::open(&db_path)?;
//! let gateway = RestGateway::new("https://project.example/rest/v1", api_key)?;
//! let manager = SyncManager::new(store, gateway, SyncConfig::default());
//!
//! manager.enqueue(EntityKind::WorkOrder, Operation::Insert, payload, None)?;
//! let summary = manager.replay_all().await?;
//! ```

mod cli;
mod commands;
mod env;

pub mod config;
pub mod error;
pub mod sync;

pub use cli::{Cli, Command, DraftCommand, OutputArgs, OutputFormat, RecoveryArg};
pub use config::Config;
pub use error::{Error, Result};

use commands::draft::SaveArgs;
use commands::{draft, queue, watch, Context};

/// Execute a parsed command line. This is the main entry point for library
/// users and provides a testable way to run commands without process execution.
pub fn run(cli: Cli) -> Result<()> {
    let ctx = Context::load(cli.config.as_deref(), cli.db.as_deref())?;

    match cli.command {
        Command::Enqueue {
            kind,
            operation,
            payload,
            id,
        } => queue::enqueue(&ctx, kind, operation, payload, id),
        Command::Replay { output } => queue::replay(&ctx, output.output),
        Command::Status { output } => queue::status(&ctx, output.output),
        Command::Pending { kind, output } => queue::pending(&ctx, kind, output.output),
        Command::Remove { id } => queue::remove(&ctx, &id),
        Command::Clear { force } => queue::clear(&ctx, force),
        Command::Watch => watch::run(&ctx),
        Command::Draft(cmd) => match cmd {
            DraftCommand::Save {
                id,
                state,
                owner,
                template,
                updated_at,
                sync,
            } => draft::save(
                &ctx,
                SaveArgs {
                    id,
                    state,
                    owner,
                    template,
                    updated_at,
                    sync,
                },
            ),
            DraftCommand::Show { id, output } => draft::show(&ctx, &id, output.output),
            DraftCommand::List { output } => draft::list(&ctx, output.output),
            DraftCommand::MarkSynced { id } => draft::mark_synced(&ctx, &id),
            DraftCommand::Delete { id } => draft::delete(&ctx, &id),
            DraftCommand::Check {
                id,
                remote_updated_at,
                output,
            } => draft::check(&ctx, &id, remote_updated_at, output.output),
            DraftCommand::Resolve { id, choice } => draft::resolve(&ctx, &id, choice),
        },
    }
}

/// Filter directives for the log subscriber: `OUTBOX_LOG`, else `warn`.
pub fn log_filter() -> String {
    env::log_filter().unwrap_or_else(|| "warn".to_string())
}
