// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Draft conflict detection and recovery.
//!
//! On entity load the caller compares the local draft with the remote
//! record's last-modified time. Only a strictly newer unsynced draft is
//! offered for recovery; ties within the same millisecond are not a conflict.

use chrono::{DateTime, Utc};
use outbox_core::{truncate_millis, ClockSource, DraftStore, LocalDraftRecord, Result};
use serde::Serialize;

/// Whether a recovery prompt is warranted for `local`.
///
/// A missing remote record counts as older than any local edit. Both sides
/// are compared at millisecond precision.
pub fn needs_recovery(local: &LocalDraftRecord, remote_updated_at: Option<DateTime<Utc>>) -> bool {
    !local.synced
        && remote_updated_at.is_none_or(|remote| {
            truncate_millis(local.updated_at) > truncate_millis(remote)
        })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "draft", rename_all = "snake_case")]
pub enum ConflictCheck {
    NoConflict,
    RecoveryAvailable(LocalDraftRecord),
}

/// The user's answer to a recovery prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryChoice {
    /// Keep the local draft and save it again.
    Restore,
    /// Drop the local draft.
    Discard,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The draft to load into the editor, already re-saved locally.
    Restored(LocalDraftRecord),
    Discarded,
}

pub struct ConflictResolver<'a> {
    drafts: &'a DraftStore,
    clock: &'a dyn ClockSource,
}

impl<'a> ConflictResolver<'a> {
    pub fn new(drafts: &'a DraftStore, clock: &'a dyn ClockSource) -> Self {
        ConflictResolver { drafts, clock }
    }

    /// Look up the draft for `id` and decide whether to offer recovery.
    pub fn check(&self, id: &str, remote_updated_at: Option<DateTime<Utc>>) -> Result<ConflictCheck> {
        match self.drafts.load_local(id)? {
            Some(draft) if needs_recovery(&draft, remote_updated_at) => {
                tracing::debug!(draft = %id, "unsynced local draft is newer than remote");
                Ok(ConflictCheck::RecoveryAvailable(draft))
            }
            _ => Ok(ConflictCheck::NoConflict),
        }
    }

    /// Apply the user's choice.
    ///
    /// Restoring counts as a fresh local edit: the draft is saved again with
    /// the current time and stays unsynced.
    pub fn resolve(&self, draft: LocalDraftRecord, choice: RecoveryChoice) -> Result<Resolution> {
        match choice {
            RecoveryChoice::Restore => {
                let restored = LocalDraftRecord {
                    synced: false,
                    updated_at: self.clock.now(),
                    ..draft
                };
                self.drafts.save_local(&restored)?;
                Ok(Resolution::Restored(restored))
            }
            RecoveryChoice::Discard => {
                self.drafts.delete_local(&draft.id)?;
                Ok(Resolution::Discarded)
            }
        }
    }
}

#[cfg(test)]
#[path = "conflict_tests.rs"]
mod tests;
