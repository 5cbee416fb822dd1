// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sync manager: enqueue, replay, and retry bookkeeping.
//!
//! Each queued record moves through a small state machine:
//!
//! ```text
//! Pending(0) ──fail──► Pending(n) ──fail, n+1 == max──► Abandoned (deleted, reported)
//!     │                    │
//!     └──────ok────────────┴──────ok──► Applied (deleted)
//! ```
//!
//! A replay pass reads one snapshot of the queue in `enqueued_at` order and
//! makes at most one apply attempt per record. A failed record never stops
//! the pass; a store failure aborts it.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use outbox_core::{
    generate_sync_id, ClockSource, DraftLink, DraftStore, EntityKind, Error, LocalDraftRecord,
    Mutation, MutationStore, Operation, PendingMutation, Result, SystemClock,
    DEFAULT_MAX_RETRIES,
};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;

use super::gateway::{Gateway, GatewayError};
use super::wake::{BackgroundWake, NoopWake};

/// Tuning for replay passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncConfig {
    /// Retry ceiling stamped on every newly enqueued record.
    pub max_retries: u32,
    /// Upper bound on a single gateway call.
    pub apply_timeout: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            max_retries: DEFAULT_MAX_RETRIES,
            apply_timeout: Duration::from_secs(10),
        }
    }
}

/// A record abandoned during a replay pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplayFailure {
    pub id: String,
    pub error: String,
}

/// Outcome of one replay pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReplaySummary {
    pub successful: usize,
    pub failed: usize,
    pub errors: Vec<ReplayFailure>,
    /// True when another pass was already running and this call did nothing.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub coalesced: bool,
}

impl ReplaySummary {
    pub fn coalesced() -> Self {
        ReplaySummary {
            coalesced: true,
            ..Self::default()
        }
    }
}

/// Why one apply attempt failed.
#[derive(Debug)]
enum ApplyError {
    /// The queued payload can never be applied.
    Invalid(Error),
    /// The remote failed or did not answer in time.
    Remote(GatewayError),
}

impl fmt::Display for ApplyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplyError::Invalid(e) => write!(f, "validation error: {e}"),
            ApplyError::Remote(e) => write!(f, "{e}"),
        }
    }
}

/// Drains the durable queue against a [`Gateway`].
pub struct SyncManager<S: MutationStore, G: Gateway> {
    store: S,
    gateway: G,
    config: SyncConfig,
    wake: Arc<dyn BackgroundWake>,
    clock: Arc<dyn ClockSource>,
    drafts: Option<Arc<DraftStore>>,
    replay_guard: Mutex<()>,
}

impl<S: MutationStore, G: Gateway> SyncManager<S, G> {
    pub fn new(store: S, gateway: G, config: SyncConfig) -> Self {
        SyncManager {
            store,
            gateway,
            config,
            wake: Arc::new(NoopWake),
            clock: Arc::new(SystemClock),
            drafts: None,
            replay_guard: Mutex::new(()),
        }
    }

    /// Use `wake` for best-effort replay scheduling after each enqueue.
    pub fn with_wake(mut self, wake: Arc<dyn BackgroundWake>) -> Self {
        self.wake = wake;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn ClockSource>) -> Self {
        self.clock = clock;
        self
    }

    /// Attach the draft store that linked drafts are marked synced in.
    pub fn with_drafts(mut self, drafts: Arc<DraftStore>) -> Self {
        self.drafts = Some(drafts);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn drafts(&self) -> Option<&DraftStore> {
        self.drafts.as_deref()
    }

    /// Queue an untyped mutation and return its id.
    ///
    /// The payload is not validated here; a malformed payload is abandoned on
    /// the first replay pass.
    /// An explicit `id` that is already queued is refused with
    /// [`Error::DuplicateMutationId`].
    pub fn enqueue(
        &self,
        kind: EntityKind,
        operation: Operation,
        payload: Value,
        id: Option<String>,
    ) -> Result<String> {
        let record = self.build(kind, operation, payload, id);
        self.persist(record)
    }

    /// Queue a typed mutation and return its id.
    pub fn enqueue_mutation(
        &self,
        kind: EntityKind,
        mutation: &Mutation,
        id: Option<String>,
    ) -> Result<String> {
        self.enqueue(kind, mutation.operation(), mutation.to_payload(), id)
    }

    /// Save `draft` locally, then queue `mutation` linked to it.
    ///
    /// The draft is written before the mutation so a crash in between leaves
    /// recoverable local state and no orphaned queue record.
    pub fn save_and_enqueue(
        &self,
        draft: &LocalDraftRecord,
        kind: EntityKind,
        mutation: &Mutation,
    ) -> Result<String> {
        let drafts = self.drafts.as_deref().ok_or(Error::DraftStoreDetached)?;
        drafts.save_local(draft)?;

        let record = self
            .build(kind, mutation.operation(), mutation.to_payload(), None)
            .with_draft(DraftLink {
                id: draft.id.clone(),
                updated_at: draft.updated_at,
            });
        self.persist(record)
    }

    fn build(
        &self,
        kind: EntityKind,
        operation: Operation,
        payload: Value,
        id: Option<String>,
    ) -> PendingMutation {
        let id = id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| generate_sync_id(self.clock.now_ms()));
        PendingMutation::new(
            id,
            kind,
            operation,
            payload,
            self.clock.now(),
            self.config.max_retries,
        )
    }

    fn persist(&self, record: PendingMutation) -> Result<String> {
        // put is an upsert; a queued record keeps its retry state.
        if self.store.get(&record.id)?.is_some() {
            return Err(Error::DuplicateMutationId(record.id));
        }
        self.store.put(&record)?;
        tracing::debug!(id = %record.id, kind = %record.entity_kind, op = %record.operation, "enqueued");

        if self.wake.is_supported() {
            if let Err(e) = self.wake.register(record.entity_kind) {
                tracing::warn!(kind = %record.entity_kind, error = %e, "wake registration failed");
            }
        }
        Ok(record.id)
    }

    /// Attempt every queued record once.
    ///
    /// A record whose retry budget is already spent, such as one stamped with
    /// `max_retries == 0`, is abandoned without a gateway call.
    ///
    /// Returns a coalesced, empty summary when another pass is in flight.
    /// Store failures abort the pass and propagate; records already handled
    /// in this pass keep their new state.
    pub async fn replay_all(&self) -> Result<ReplaySummary> {
        let Ok(_guard) = self.replay_guard.try_lock() else {
            tracing::debug!("replay already running, coalescing");
            return Ok(ReplaySummary::coalesced());
        };

        let snapshot = self.store.get_all()?;
        let mut summary = ReplaySummary::default();
        if snapshot.is_empty() {
            return Ok(summary);
        }

        for mut record in snapshot {
            if record.is_exhausted() {
                let error = record
                    .last_error
                    .clone()
                    .unwrap_or_else(|| "retry budget exhausted".to_string());
                self.abandon(record, error, &mut summary)?;
                continue;
            }

            match self.apply(&record).await {
                Ok(()) => {
                    self.store.delete(&record.id)?;
                    self.mark_draft_synced(&record);
                    summary.successful += 1;
                    tracing::debug!(id = %record.id, "applied");
                }
                Err(err) => {
                    match &err {
                        ApplyError::Invalid(_) => record.record_permanent_failure(err.to_string()),
                        ApplyError::Remote(_) => record.record_failure(err.to_string()),
                    }

                    if record.is_exhausted() {
                        self.abandon(record, err.to_string(), &mut summary)?;
                    } else {
                        tracing::warn!(
                            id = %record.id,
                            attempt = record.retry_count,
                            max = record.max_retries,
                            error = %err,
                            "apply failed, will retry"
                        );
                        self.store.put(&record)?;
                    }
                }
            }
        }

        tracing::info!(
            successful = summary.successful,
            failed = summary.failed,
            "replay pass complete"
        );
        Ok(summary)
    }

    fn abandon(
        &self,
        record: PendingMutation,
        error: String,
        summary: &mut ReplaySummary,
    ) -> Result<()> {
        self.store.delete(&record.id)?;
        tracing::warn!(
            id = %record.id,
            retries = record.retry_count,
            error = %error,
            "abandoning mutation"
        );
        summary.failed += 1;
        summary.errors.push(ReplayFailure {
            id: record.id,
            error,
        });
        Ok(())
    }

    /// Run a replay pass for a background trigger, logging instead of
    /// propagating store failures. The next trigger retries the whole pass.
    pub async fn replay_for(&self, trigger: &'static str) -> Option<ReplaySummary> {
        match self.replay_all().await {
            Ok(summary) => {
                tracing::debug!(trigger, coalesced = summary.coalesced, "triggered replay");
                Some(summary)
            }
            Err(e) => {
                tracing::warn!(trigger, error = %e, "replay pass aborted");
                None
            }
        }
    }

    async fn apply(&self, record: &PendingMutation) -> std::result::Result<(), ApplyError> {
        let mutation = record.mutation().map_err(ApplyError::Invalid)?;
        let kind = record.entity_kind;

        let call = match mutation {
            Mutation::Insert { record } => self.gateway.insert(kind, record),
            Mutation::Update { id, changes } => self.gateway.update(kind, id, changes),
            Mutation::Delete { id } => self.gateway.delete(kind, id),
        };

        match tokio::time::timeout(self.config.apply_timeout, call).await {
            Ok(result) => result.map_err(ApplyError::Remote),
            Err(_) => Err(ApplyError::Remote(GatewayError::Timeout(
                self.config.apply_timeout,
            ))),
        }
    }

    fn mark_draft_synced(&self, record: &PendingMutation) {
        let (Some(drafts), Some(link)) = (self.drafts.as_deref(), record.draft.as_ref()) else {
            return;
        };
        match drafts.mark_synced_at(&link.id, link.updated_at) {
            Ok(true) => tracing::debug!(draft = %link.id, "draft marked synced"),
            Ok(false) => tracing::debug!(draft = %link.id, "draft changed since enqueue, left unsynced"),
            Err(e) => tracing::warn!(draft = %link.id, error = %e, "failed to mark draft synced"),
        }
    }

    pub fn pending_count(&self) -> Result<usize> {
        self.store.count()
    }

    pub fn pending_for(&self, kind: EntityKind) -> Result<Vec<PendingMutation>> {
        self.store.get_all_by_entity_kind(kind)
    }

    pub fn pending(&self) -> Result<Vec<PendingMutation>> {
        self.store.get_all()
    }

    /// Pending counts per entity kind. Kinds with nothing queued are omitted.
    pub fn pending_summary(&self) -> Result<BTreeMap<EntityKind, usize>> {
        let mut summary = BTreeMap::new();
        for record in self.store.get_all()? {
            *summary.entry(record.entity_kind).or_insert(0) += 1;
        }
        Ok(summary)
    }

    /// Drop one queued record. Returns false if it was not queued.
    pub fn remove(&self, id: &str) -> Result<bool> {
        self.store.delete(id)
    }

    /// Drop every queued record, returning how many were discarded.
    pub fn clear_all(&self) -> Result<usize> {
        let dropped = self.store.clear()?;
        if dropped > 0 {
            tracing::warn!(dropped, "cleared pending mutations");
        }
        Ok(dropped)
    }

    pub fn is_background_wake_supported(&self) -> bool {
        self.wake.is_supported()
    }
}

impl<S: MutationStore, G: Gateway> fmt::Debug for SyncManager<S, G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncManager")
            .field("config", &self.config)
            .field("wake_supported", &self.wake.is_supported())
            .field("drafts", &self.drafts.is_some())
            .finish()
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
