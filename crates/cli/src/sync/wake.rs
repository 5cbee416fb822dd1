// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Background-wake capability.
//!
//! A wake facility lets the host schedule a replay outside the periodic timer.
//! Registration is always best-effort: callers log failures and carry on.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use outbox_core::EntityKind;
use tokio::sync::Notify;

#[derive(Debug, thiserror::Error)]
pub enum WakeError {
    #[error("background wake is not supported on this host")]
    Unsupported,

    #[error("background wake registration failed: {0}")]
    Registration(String),
}

/// Platform hook that can trigger a replay for an entity kind.
pub trait BackgroundWake: Send + Sync {
    fn is_supported(&self) -> bool;

    /// Asks the host to schedule a replay for `kind`.
    fn register(&self, kind: EntityKind) -> Result<(), WakeError>;
}

/// Wake facility for hosts without one. Replay falls back to the periodic
/// scheduler.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopWake;

impl BackgroundWake for NoopWake {
    fn is_supported(&self) -> bool {
        false
    }

    fn register(&self, _kind: EntityKind) -> Result<(), WakeError> {
        Err(WakeError::Unsupported)
    }
}

/// In-process wake backed by a [`Notify`].
///
/// Each registration stores a permit, so a listener that starts waiting after
/// the registration still wakes once.
#[derive(Debug, Default)]
pub struct NotifyWake {
    notify: Arc<Notify>,
    registered: Mutex<BTreeSet<EntityKind>>,
}

impl NotifyWake {
    pub fn new() -> Self {
        Self::default()
    }

    /// Completes when a registration arrives.
    pub async fn notified(&self) {
        self.notify.notified().await;
    }

    /// Entity kinds that have requested a wake since the last [`Self::take_registered`].
    pub fn registered_kinds(&self) -> Vec<EntityKind> {
        match self.registered.lock() {
            Ok(kinds) => kinds.iter().copied().collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Drains the registered kinds.
    pub fn take_registered(&self) -> Vec<EntityKind> {
        match self.registered.lock() {
            Ok(mut kinds) => std::mem::take(&mut *kinds).into_iter().collect(),
            Err(_) => Vec::new(),
        }
    }
}

impl BackgroundWake for NotifyWake {
    fn is_supported(&self) -> bool {
        true
    }

    fn register(&self, kind: EntityKind) -> Result<(), WakeError> {
        self.registered
            .lock()
            .map_err(|e| WakeError::Registration(e.to_string()))?
            .insert(kind);
        self.notify.notify_one();
        Ok(())
    }
}

#[cfg(test)]
#[path = "wake_tests.rs"]
mod tests;
