// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Offline-first sync engine.
//!
//! Writes are queued durably and replayed against the remote system of record
//! whenever a trigger fires.
//!
//! # Architecture
//!
//! ```text
//!                  ┌──────────────┐
//!  enqueue ───────►│ SyncManager  │────► Gateway (trait) ────► Remote
//!                  │              │
//!                  └──────┬───────┘
//!                         │ replay_all
//!         ┌───────────────┼────────────────┐
//!   ┌─────┴─────┐  ┌──────┴───────┐  ┌─────┴─────┐
//!   │ Scheduler │  │ Connectivity │  │   Wake    │
//!   │ (periodic)│  │  (reconnect) │  │ (notify)  │
//!   └───────────┘  └──────────────┘  └───────────┘
//! ```
//!
//! # Features
//!
//! - Durable SQLite queue replayed in `enqueued_at` order
//! - Bounded retries; validation failures are abandoned immediately
//! - Concurrent replay triggers coalesce into one pass
//! - Per-call apply timeout
//! - Draft conflict detection with restore/discard recovery
//! - Injectable gateway, clock, and wake facility for testing

mod conflict;
mod connectivity;
mod gateway;
mod manager;
mod runner;
mod scheduler;
mod wake;

pub use conflict::{needs_recovery, ConflictCheck, ConflictResolver, RecoveryChoice, Resolution};
pub use connectivity::{
    probe_loop, replay_on_reconnect, ConnectivityMonitor, ConnectivityState, Transition,
};
pub use gateway::{
    DetachedGateway, Gateway, GatewayError, GatewayFuture, GatewayResult, RestGateway,
};
pub use manager::{ReplayFailure, ReplaySummary, SyncConfig, SyncManager};
pub use runner::{Runner, RunnerOptions};
pub use scheduler::{start_periodic_check, PeriodicCheck};
pub use wake::{BackgroundWake, NoopWake, NotifyWake, WakeError};
