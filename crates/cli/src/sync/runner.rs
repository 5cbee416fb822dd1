// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Background runner: every replay trigger under one cancellation token.
//!
//! The runner owns:
//! 1. The periodic scheduler (queue non-empty and online)
//! 2. The reconnect listener (offline to online transitions)
//! 3. The connectivity probe, when a probe interval is set
//! 4. The wake listener, when an in-process wake facility is attached

use std::sync::Arc;
use std::time::Duration;

use outbox_core::MutationStore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::connectivity::{probe_loop, replay_on_reconnect, ConnectivityMonitor};
use super::gateway::Gateway;
use super::manager::SyncManager;
use super::scheduler::{start_periodic_check, PeriodicCheck};
use super::wake::NotifyWake;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerOptions {
    pub check_interval: Duration,
    /// Poll the gateway for reachability. `None` leaves the monitor to the
    /// caller.
    pub probe_interval: Option<Duration>,
}

pub struct Runner {
    cancel: CancellationToken,
    periodic: PeriodicCheck,
    tasks: Vec<JoinHandle<()>>,
}

impl Runner {
    /// Spawn all background triggers. Must be called from within a Tokio
    /// runtime.
    pub fn start<S, G>(
        manager: Arc<SyncManager<S, G>>,
        monitor: Arc<ConnectivityMonitor>,
        options: RunnerOptions,
        wake: Option<Arc<NotifyWake>>,
    ) -> Self
    where
        S: MutationStore + 'static,
        G: Gateway + 'static,
    {
        let cancel = CancellationToken::new();
        let mut tasks = Vec::new();

        tasks.push(tokio::spawn(replay_on_reconnect(
            Arc::clone(&monitor),
            Arc::clone(&manager),
            cancel.clone(),
        )));

        if let Some(interval) = options.probe_interval {
            tasks.push(tokio::spawn(probe_loop(
                Arc::clone(&monitor),
                Arc::clone(&manager),
                interval,
                cancel.clone(),
            )));
        }

        if let Some(wake) = wake {
            tasks.push(tokio::spawn(wake_listener(
                wake,
                Arc::clone(&monitor),
                Arc::clone(&manager),
                cancel.clone(),
            )));
        }

        let periodic = start_periodic_check(manager, monitor, options.check_interval);
        tracing::debug!(tasks = tasks.len() + 1, "runner started");

        Runner {
            cancel,
            periodic,
            tasks,
        }
    }

    /// A token that is cancelled when the runner shuts down.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stop every trigger and wait for in-flight passes to finish.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        self.periodic.shutdown().await;
        for task in self.tasks {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "runner task failed");
            }
        }
        tracing::debug!("runner stopped");
    }
}

async fn wake_listener<S, G>(
    wake: Arc<NotifyWake>,
    monitor: Arc<ConnectivityMonitor>,
    manager: Arc<SyncManager<S, G>>,
    cancel: CancellationToken,
) where
    S: MutationStore,
    G: Gateway,
{
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = wake.notified() => {
                let kinds = wake.take_registered();
                tracing::debug!(?kinds, "wake requested");
                if monitor.is_online() {
                    manager.replay_for("wake").await;
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
