// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Local draft commands.

use chrono::{DateTime, Utc};
use outbox_core::{
    ClockSource, DraftStore, EntityKind, LocalDraftRecord, Mutation, Operation, SystemClock,
    PENDING_DRAFT_ID,
};
use serde_json::Value;

use crate::cli::{OutputFormat, RecoveryArg};
use crate::error::{Error, Result};
use crate::sync::{ConflictCheck, ConflictResolver, DetachedGateway, RecoveryChoice, Resolution};

use super::{format_time, Context};

/// Fields for `draft save`.
pub struct SaveArgs {
    pub id: String,
    pub state: Value,
    pub owner: String,
    pub template: String,
    pub updated_at: Option<DateTime<Utc>>,
    pub sync: Option<Operation>,
}

pub fn save(ctx: &Context, args: SaveArgs) -> Result<()> {
    let updated_at = args.updated_at.unwrap_or_else(|| SystemClock.now());
    let draft = LocalDraftRecord::new(args.id, args.state, updated_at, args.owner, args.template);

    match args.sync {
        None => {
            ctx.drafts()?.save_local(&draft)?;
            println!("saved {} locally (unsynced)", draft.id);
        }
        Some(operation) => {
            let kind: EntityKind = draft.template.parse()?;
            let mutation = draft_mutation(&draft, operation)?;
            let queued = ctx
                .manager(DetachedGateway)?
                .save_and_enqueue(&draft, kind, &mutation)?;
            println!("saved {} locally, queued {}", draft.id, queued);
        }
    }
    Ok(())
}

/// Build the mutation a draft stands for.
///
/// The draft id becomes the record id unless the state carries its own or the
/// draft is still the placeholder.
pub(crate) fn draft_mutation(
    draft: &LocalDraftRecord,
    operation: Operation,
) -> outbox_core::Result<Mutation> {
    let mut payload = draft.state.clone();
    if let Value::Object(fields) = &mut payload {
        if !fields.contains_key("id") && draft.id != PENDING_DRAFT_ID {
            fields.insert("id".into(), Value::String(draft.id.clone()));
        }
    }
    Mutation::from_payload(operation, &payload)
}

pub fn show(ctx: &Context, id: &str, output: OutputFormat) -> Result<()> {
    let draft = load(&ctx.drafts()?, id)?;

    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&draft)?),
        OutputFormat::Text => {
            println!("id: {}", draft.id);
            println!("template: {}", draft.template);
            println!("owner: {}", draft.owner_user_id);
            println!("updated: {}", format_time(&draft.updated_at));
            println!("synced: {}", if draft.synced { "yes" } else { "no" });
            println!("state: {}", serde_json::to_string(&draft.state)?);
        }
    }
    Ok(())
}

pub fn list(ctx: &Context, output: OutputFormat) -> Result<()> {
    let drafts = ctx.drafts()?.list_unsynced()?;

    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&drafts)?),
        OutputFormat::Text => {
            for draft in &drafts {
                println!(
                    "{}  {}  {}  updated {}",
                    draft.id,
                    draft.template,
                    draft.owner_user_id,
                    format_time(&draft.updated_at)
                );
            }
        }
    }
    Ok(())
}

pub fn mark_synced(ctx: &Context, id: &str) -> Result<()> {
    if !ctx.drafts()?.mark_synced(id)? {
        return Err(Error::DraftNotFound(id.to_string()));
    }
    println!("marked {id} synced");
    Ok(())
}

pub fn delete(ctx: &Context, id: &str) -> Result<()> {
    if !ctx.drafts()?.delete_local(id)? {
        return Err(Error::DraftNotFound(id.to_string()));
    }
    println!("deleted draft {id}");
    Ok(())
}

pub fn check(
    ctx: &Context,
    id: &str,
    remote_updated_at: Option<DateTime<Utc>>,
    output: OutputFormat,
) -> Result<()> {
    let drafts = ctx.drafts()?;
    let resolver = ConflictResolver::new(&drafts, &SystemClock);
    let result = resolver.check(id, remote_updated_at)?;

    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string(&result)?),
        OutputFormat::Text => match &result {
            ConflictCheck::NoConflict => println!("no conflict"),
            ConflictCheck::RecoveryAvailable(draft) => {
                let remote = remote_updated_at
                    .map(|at| format_time(&at))
                    .unwrap_or_else(|| "absent".to_string());
                println!(
                    "recovery available: local draft {} updated {} is newer than remote ({})",
                    draft.id,
                    format_time(&draft.updated_at),
                    remote
                );
            }
        },
    }
    Ok(())
}

pub fn resolve(ctx: &Context, id: &str, choice: RecoveryArg) -> Result<()> {
    let drafts = ctx.drafts()?;
    let draft = load(&drafts, id)?;
    let resolver = ConflictResolver::new(&drafts, &SystemClock);

    let choice = match choice {
        RecoveryArg::Restore => RecoveryChoice::Restore,
        RecoveryArg::Discard => RecoveryChoice::Discard,
    };
    match resolver.resolve(draft, choice)? {
        Resolution::Restored(draft) => println!(
            "restored {} (saved {})",
            draft.id,
            format_time(&draft.updated_at)
        ),
        Resolution::Discarded => println!("discarded {id}"),
    }
    Ok(())
}

fn load(drafts: &DraftStore, id: &str) -> Result<LocalDraftRecord> {
    drafts
        .load_local(id)?
        .ok_or_else(|| Error::DraftNotFound(id.to_string()))
}

#[cfg(test)]
#[path = "draft_tests.rs"]
mod tests;
