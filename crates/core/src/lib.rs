// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! outbox-core: durable local state for the offline sync engine.
//!
//! This crate provides the data model for queued mutations and local drafts,
//! the SQLite-backed stores that persist them across restarts, and the clock
//! abstraction every timestamp is taken from.

pub mod clock;
pub mod db;
pub mod draft;
pub mod entity;
pub mod error;
pub mod mutation;
pub mod queue;

pub use clock::{from_millis, truncate_millis, ClockSource, ManualClock, SystemClock};
pub use draft::{DraftStore, LocalDraftRecord, PENDING_DRAFT_ID};
pub use entity::EntityKind;
pub use error::{Error, Result};
pub use mutation::{
    generate_sync_id, DraftLink, Mutation, Operation, PendingMutation, RecordId,
    DEFAULT_MAX_RETRIES,
};
pub use queue::{MutationStore, QueueStore};
