// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Rust specs for config file discovery and validation.

#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use yare::parameterized;

fn outbox() -> Command {
    let mut cmd = cargo_bin_cmd!("outbox");
    cmd.env_remove("OUTBOX_CONFIG")
        .env_remove("OUTBOX_API_KEY")
        .env_remove("OUTBOX_LOG");
    cmd
}

#[test]
fn missing_config_file_uses_defaults() {
    let temp = TempDir::new().unwrap();
    outbox()
        .arg("--config")
        .arg(temp.path().join("absent.toml"))
        .arg("--db")
        .arg(temp.path().join("q.db"))
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("remote: not configured"));
}

#[test]
fn store_path_resolves_against_config_dir() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("config.toml");
    std::fs::write(&config, "[store]\npath = \"data/queue.db\"\n").unwrap();

    outbox()
        .arg("--config")
        .arg(&config)
        .args(["enqueue", "invoice", "insert"])
        .assert()
        .success();

    assert!(temp.path().join("data/queue.db").exists());
}

#[test]
fn config_from_environment_variable() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("env.toml");
    std::fs::write(&config, "[remote]\nurl = \"https://api.example.test/rest/v1\"\n").unwrap();

    outbox()
        .env("OUTBOX_CONFIG", &config)
        .arg("--db")
        .arg(temp.path().join("q.db"))
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "remote: https://api.example.test/rest/v1",
        ));
}

#[test]
fn config_flag_wins_over_environment() {
    let temp = TempDir::new().unwrap();
    let from_env = temp.path().join("env.toml");
    let from_flag = temp.path().join("flag.toml");
    std::fs::write(&from_env, "[remote]\nurl = \"http://env.test\"\n").unwrap();
    std::fs::write(&from_flag, "[remote]\nurl = \"http://flag.test\"\n").unwrap();

    outbox()
        .env("OUTBOX_CONFIG", &from_env)
        .arg("--config")
        .arg(&from_flag)
        .arg("--db")
        .arg(temp.path().join("q.db"))
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("remote: http://flag.test"));
}

#[test]
fn configured_max_retries_is_stamped_on_new_records() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("config.toml");
    std::fs::write(&config, "[sync]\nmax_retries = 2\n").unwrap();
    let db = temp.path().join("q.db");

    outbox()
        .arg("--config")
        .arg(&config)
        .arg("--db")
        .arg(&db)
        .args(["enqueue", "customer", "insert"])
        .assert()
        .success();

    outbox()
        .arg("--config")
        .arg(&config)
        .arg("--db")
        .arg(&db)
        .arg("pending")
        .assert()
        .success()
        .stdout(predicate::str::contains("attempts 0/2"));
}

#[parameterized(
    zero_retries = { "[sync]\nmax_retries = 0\n", "sync.max_retries" },
    zero_interval = { "[sync]\ncheck_interval_ms = 0\n", "sync.check_interval_ms" },
    bad_url = { "[remote]\nurl = \"ws://example.test\"\n", "remote.url" },
    malformed = { "[sync\n", "failed to parse" },
)]
fn invalid_config_is_rejected(content: &str, expected: &str) {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("config.toml");
    std::fs::write(&config, content).unwrap();

    outbox()
        .arg("--config")
        .arg(&config)
        .arg("--db")
        .arg(temp.path().join("q.db"))
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::starts_with("error: config error:"))
        .stderr(predicate::str::contains(expected));
}

#[test]
fn log_filter_writes_to_stderr_only() {
    let temp = TempDir::new().unwrap();
    outbox()
        .env("OUTBOX_LOG", "outbox=debug")
        .arg("--config")
        .arg(temp.path().join("absent.toml"))
        .arg("--db")
        .arg(temp.path().join("q.db"))
        .args(["enqueue", "invoice", "insert", "--id", "q-1"])
        .assert()
        .success()
        .stdout("q-1\n")
        .stderr(predicate::str::contains("resolved database path"));
}
