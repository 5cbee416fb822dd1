// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Queue commands: enqueue, replay, status, pending, remove, clear.

use std::collections::BTreeMap;

use outbox_core::{DraftStore, EntityKind, MutationStore, Operation, PendingMutation};
use serde::Serialize;
use serde_json::Value;

use crate::cli::OutputFormat;
use crate::error::{Error, Result};
use crate::sync::{DetachedGateway, Gateway, ReplaySummary, SyncManager};

use super::{format_time, Context};

pub fn enqueue(
    ctx: &Context,
    kind: EntityKind,
    operation: Operation,
    payload: Value,
    id: Option<String>,
) -> Result<()> {
    let manager = ctx.manager(DetachedGateway)?;
    let id = manager.enqueue(kind, operation, payload, id)?;
    println!("{id}");
    Ok(())
}

pub fn replay(ctx: &Context, output: OutputFormat) -> Result<()> {
    let manager = ctx.manager(ctx.gateway()?)?;
    let runtime = tokio::runtime::Runtime::new()?;
    let summary = runtime.block_on(manager.replay_all())?;
    print_summary(&summary, output)
}

pub(crate) fn print_summary(summary: &ReplaySummary, output: OutputFormat) -> Result<()> {
    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string(summary)?),
        OutputFormat::Text => {
            if summary.coalesced {
                println!("replay already in progress");
                return Ok(());
            }
            println!(
                "replayed: {} applied, {} abandoned",
                summary.successful, summary.failed
            );
            for failure in &summary.errors {
                println!("  abandoned {}: {}", failure.id, failure.error);
            }
        }
    }
    Ok(())
}

#[derive(Debug, Serialize, PartialEq)]
pub(crate) struct Status {
    pub pending: usize,
    pub by_kind: BTreeMap<EntityKind, usize>,
    pub unsynced_drafts: usize,
    pub remote: Option<String>,
    pub background_wake: bool,
}

pub fn status(ctx: &Context, output: OutputFormat) -> Result<()> {
    let manager = ctx.manager(DetachedGateway)?;
    let drafts = ctx.drafts()?;
    let status = build_status(&manager, &drafts, ctx.config.remote_url())?;

    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string(&status)?),
        OutputFormat::Text => {
            println!("pending: {}", status.pending);
            for (kind, count) in &status.by_kind {
                println!("  {kind}: {count}");
            }
            println!("unsynced drafts: {}", status.unsynced_drafts);
            println!(
                "remote: {}",
                status.remote.as_deref().unwrap_or("not configured")
            );
            if !status.background_wake {
                println!("background wake: unsupported (periodic replay)");
            }
        }
    }
    Ok(())
}

pub(crate) fn build_status<S: MutationStore, G: Gateway>(
    manager: &SyncManager<S, G>,
    drafts: &DraftStore,
    remote: Option<&str>,
) -> Result<Status> {
    let by_kind = manager.pending_summary()?;
    Ok(Status {
        pending: by_kind.values().sum(),
        by_kind,
        unsynced_drafts: drafts.list_unsynced()?.len(),
        remote: remote.map(str::to_string),
        background_wake: manager.is_background_wake_supported(),
    })
}

pub fn pending(ctx: &Context, kind: Option<EntityKind>, output: OutputFormat) -> Result<()> {
    let manager = ctx.manager(DetachedGateway)?;
    let records = match kind {
        Some(kind) => manager.pending_for(kind)?,
        None => manager.pending()?,
    };

    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&records)?),
        OutputFormat::Text => {
            for record in &records {
                println!("{}", format_pending(record));
            }
        }
    }
    Ok(())
}

pub(crate) fn format_pending(record: &PendingMutation) -> String {
    let mut line = format!(
        "{}  {} {}  attempts {}/{}  queued {}",
        record.id,
        record.operation,
        record.entity_kind,
        record.retry_count,
        record.max_retries,
        format_time(&record.enqueued_at),
    );
    if let Some(error) = &record.last_error {
        line.push_str(&format!("  last error: {error}"));
    }
    line
}

pub fn remove(ctx: &Context, id: &str) -> Result<()> {
    let manager = ctx.manager(DetachedGateway)?;
    if !manager.remove(id)? {
        return Err(Error::MutationNotFound(id.to_string()));
    }
    println!("removed {id}");
    Ok(())
}

pub fn clear(ctx: &Context, force: bool) -> Result<()> {
    let manager = ctx.manager(DetachedGateway)?;
    let dropped = clear_impl(&manager, force)?;
    println!("cleared {dropped} pending mutation(s)");
    Ok(())
}

pub(crate) fn clear_impl<S: MutationStore, G: Gateway>(
    manager: &SyncManager<S, G>,
    force: bool,
) -> Result<usize> {
    let count = manager.pending_count()?;
    if count > 0 && !force {
        return Err(Error::ClearRequiresForce { count });
    }
    Ok(manager.clear_all()?)
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
