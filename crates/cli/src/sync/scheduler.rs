// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic replay scheduler.
//!
//! Fallback trigger for hosts without a background-wake facility: checks the
//! queue on a fixed interval and replays when there is work and the remote is
//! reachable. The first check runs immediately.

use std::sync::Arc;
use std::time::Duration;

use outbox_core::MutationStore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::connectivity::ConnectivityMonitor;
use super::gateway::Gateway;
use super::manager::SyncManager;

/// Handle to a running periodic check. Dropping it stops the check.
pub struct PeriodicCheck {
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

/// Start checking the queue every `interval`.
///
/// Must be called from within a Tokio runtime.
pub fn start_periodic_check<S, G>(
    manager: Arc<SyncManager<S, G>>,
    monitor: Arc<ConnectivityMonitor>,
    interval: Duration,
) -> PeriodicCheck
where
    S: MutationStore + 'static,
    G: Gateway + 'static,
{
    let cancel = CancellationToken::new();

    let handle = tokio::spawn(run(
        manager,
        monitor,
        interval.max(Duration::from_millis(1)),
        cancel.clone(),
    ));

    PeriodicCheck {
        cancel,
        handle: Some(handle),
    }
}

async fn run<S: MutationStore, G: Gateway>(
    manager: Arc<SyncManager<S, G>>,
    monitor: Arc<ConnectivityMonitor>,
    interval: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let pending = match manager.pending_count() {
            Ok(n) => n,
            Err(e) => {
                tracing::warn!(error = %e, "periodic check could not read the queue");
                continue;
            }
        };
        if pending == 0 || !monitor.is_online() {
            continue;
        }

        // Re-checked after the queue read. A pass that has started is not
        // interrupted by `stop`.
        if cancel.is_cancelled() {
            break;
        }
        manager.replay_for("periodic").await;
    }
}

impl PeriodicCheck {
    /// Stop future checks. Safe to call more than once.
    ///
    /// This does not wait: a pass already running when `stop` is called runs
    /// to completion, and no further pass is started. Use
    /// [`shutdown`](Self::shutdown) to wait for the running pass.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Stop and wait for the task to exit, including any in-flight pass.
    pub async fn shutdown(mut self) {
        self.stop();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "periodic check task failed");
            }
        }
    }
}

impl Drop for PeriodicCheck {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
