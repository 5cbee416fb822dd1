// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Foreground runner: replays in the background until Ctrl-C.

use std::sync::Arc;

use crate::error::Result;
use crate::sync::{ConnectivityMonitor, Runner, RunnerOptions};

use super::Context;

pub fn run(ctx: &Context) -> Result<()> {
    let gateway = ctx.gateway()?;
    let url = gateway.base_url().to_string();
    let manager = Arc::new(ctx.manager(gateway)?);
    let options = RunnerOptions {
        check_interval: ctx.config.check_interval(),
        probe_interval: Some(ctx.config.probe_interval()),
    };

    let runtime = tokio::runtime::Runtime::new()?;
    let signal = runtime.block_on(async move {
        // Offline until the first probe answers; that transition triggers the
        // initial replay.
        let monitor = Arc::new(ConnectivityMonitor::new(false));
        let runner = Runner::start(manager, monitor, options, None);
        eprintln!("watching {url} (Ctrl-C to stop)");

        let signal = tokio::signal::ctrl_c().await;
        runner.shutdown().await;
        signal
    });
    Ok(signal?)
}
