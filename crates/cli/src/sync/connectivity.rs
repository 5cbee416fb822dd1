// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Connectivity monitoring.
//!
//! The monitor holds the current online/offline state behind a watch channel
//! so background tasks can react to transitions. Every transition to online
//! bumps an epoch; listeners compare epochs so a quick offline/online flap
//! between two polls still triggers a replay.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use outbox_core::{from_millis, ClockSource, MutationStore, SystemClock};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use super::gateway::{Gateway, GatewayError};
use super::manager::SyncManager;

/// Sentinel for an instant that has not happened.
const NEVER: i64 = i64::MIN;

/// Snapshot published to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectivityState {
    pub online: bool,
    /// Number of offline-to-online transitions so far.
    pub online_epoch: u64,
}

/// Result of [`ConnectivityMonitor::set_online`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    WentOnline,
    WentOffline,
    Unchanged,
}

/// Tracks whether the remote is reachable.
pub struct ConnectivityMonitor {
    state: watch::Sender<ConnectivityState>,
    last_online_ms: AtomicI64,
    went_offline_ms: AtomicI64,
    clock: Arc<dyn ClockSource>,
}

impl ConnectivityMonitor {
    pub fn new(initially_online: bool) -> Self {
        Self::with_clock(initially_online, Arc::new(SystemClock))
    }

    pub fn with_clock(initially_online: bool, clock: Arc<dyn ClockSource>) -> Self {
        let (state, _) = watch::channel(ConnectivityState {
            online: initially_online,
            online_epoch: 0,
        });
        let now = clock.now_ms();
        let (last_online_ms, went_offline_ms) = if initially_online {
            (now, NEVER)
        } else {
            (NEVER, now)
        };
        ConnectivityMonitor {
            state,
            last_online_ms: AtomicI64::new(last_online_ms),
            went_offline_ms: AtomicI64::new(went_offline_ms),
            clock,
        }
    }

    pub fn is_online(&self) -> bool {
        self.state.borrow().online
    }

    pub fn state(&self) -> ConnectivityState {
        *self.state.borrow()
    }

    /// When the remote was last seen reachable.
    ///
    /// While online this is the current time. While offline it is the moment
    /// the monitor went offline, or `None` if it has never been online.
    pub fn last_online(&self) -> Option<DateTime<Utc>> {
        if self.is_online() {
            return Some(self.clock.now());
        }
        let last = self.last_online_ms.load(Ordering::Acquire);
        (last != NEVER).then(|| from_millis(last))
    }

    /// Elapsed time since going offline, or `None` while online.
    pub fn offline_for(&self) -> Option<Duration> {
        if self.is_online() {
            return None;
        }
        let went_offline = self.went_offline_ms.load(Ordering::Acquire);
        if went_offline == NEVER {
            return None;
        }
        let elapsed = self.clock.now_ms().saturating_sub(went_offline).max(0);
        Some(Duration::from_millis(elapsed as u64))
    }

    /// Record the latest observation, notifying subscribers on a transition.
    pub fn set_online(&self, online: bool) -> Transition {
        let now = self.clock.now_ms();
        let mut transition = Transition::Unchanged;

        self.state.send_if_modified(|state| {
            if state.online == online {
                return false;
            }
            state.online = online;
            if online {
                state.online_epoch += 1;
                transition = Transition::WentOnline;
            } else {
                transition = Transition::WentOffline;
            }
            true
        });

        match transition {
            Transition::WentOffline => {
                self.last_online_ms.store(now, Ordering::Release);
                self.went_offline_ms.store(now, Ordering::Release);
                tracing::info!("remote unreachable, working offline");
            }
            Transition::WentOnline => {
                tracing::info!("remote reachable again");
            }
            Transition::Unchanged => {}
        }
        transition
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectivityState> {
        self.state.subscribe()
    }
}

impl std::fmt::Debug for ConnectivityMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectivityMonitor")
            .field("state", &self.state())
            .finish()
    }
}

/// Run a replay every time the monitor goes online, until cancelled.
pub async fn replay_on_reconnect<S, G>(
    monitor: Arc<ConnectivityMonitor>,
    manager: Arc<SyncManager<S, G>>,
    cancel: CancellationToken,
) where
    S: MutationStore,
    G: Gateway,
{
    let mut rx = monitor.subscribe();
    let mut seen_epoch = rx.borrow_and_update().online_epoch;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let epoch = rx.borrow_and_update().online_epoch;
                if epoch != seen_epoch {
                    seen_epoch = epoch;
                    manager.replay_for("reconnect").await;
                }
            }
        }
    }
}

/// Probe the gateway every `interval` and feed the result to the monitor.
pub async fn probe_loop<S, G>(
    monitor: Arc<ConnectivityMonitor>,
    manager: Arc<SyncManager<S, G>>,
    interval: Duration,
    cancel: CancellationToken,
) where
    S: MutationStore,
    G: Gateway,
{
    let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let timeout = manager.config().apply_timeout;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let result = match tokio::time::timeout(timeout, manager.gateway().probe()).await {
                    Ok(result) => result,
                    Err(_) => Err(GatewayError::Timeout(timeout)),
                };
                if let Err(e) = &result {
                    tracing::debug!(error = %e, "probe failed");
                }
                monitor.set_online(result.is_ok());
            }
        }
    }
}

#[cfg(test)]
#[path = "connectivity_tests.rs"]
mod tests;
