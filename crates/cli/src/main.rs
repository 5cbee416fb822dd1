// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![deny(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

use std::io::IsTerminal;

use clap::Parser;
use outbox::Cli;
use tracing_subscriber::EnvFilter;

fn main() {
    setup_logging();

    let cli = Cli::parse();
    if let Err(e) = outbox::run(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn setup_logging() {
    let filter =
        EnvFilter::try_new(outbox::log_filter()).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();
}
