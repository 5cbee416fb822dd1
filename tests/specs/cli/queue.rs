// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Rust specs for the queue commands: `enqueue`, `pending`, `status`,
//! `replay`, `remove`, and `clear`.

#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::path::PathBuf;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use similar_asserts::assert_eq;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use yare::parameterized;

struct Workspace {
    temp: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Workspace {
            temp: TempDir::new().unwrap(),
        }
    }

    fn with_remote(url: &str) -> Self {
        let ws = Workspace::new();
        ws.write_config(&format!(
            "[remote]\nurl = \"{url}\"\ntimeout_ms = 2000\n"
        ));
        ws
    }

    fn config_path(&self) -> PathBuf {
        self.temp.path().join("config.toml")
    }

    fn write_config(&self, content: &str) {
        std::fs::write(self.config_path(), content).unwrap();
    }

    fn outbox(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("outbox");
        cmd.arg("--config")
            .arg(self.config_path())
            .arg("--db")
            .arg(self.temp.path().join("outbox.db"))
            .env_remove("OUTBOX_API_KEY")
            .env_remove("OUTBOX_LOG");
        cmd
    }

    fn enqueue(&self, kind: &str, operation: &str, payload: &str) -> String {
        let output = self
            .outbox()
            .args(["enqueue", kind, operation, payload])
            .output()
            .unwrap();
        assert!(output.status.success(), "{output:?}");
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }

    fn pending_json(&self) -> Vec<Value> {
        let output = self
            .outbox()
            .args(["pending", "-o", "json"])
            .output()
            .unwrap();
        assert!(output.status.success());
        serde_json::from_slice(&output.stdout).unwrap()
    }
}

// =============================================================================
// Enqueue and inspection
// =============================================================================

#[test]
fn enqueue_prints_generated_id() {
    let ws = Workspace::new();
    let id = ws.enqueue("work_order", "insert", r#"{"title":"Fix boiler"}"#);

    assert!(id.starts_with("sync-"), "{id}");
    let pending = ws.pending_json();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0]["id"], id);
    assert_eq!(pending[0]["entity_kind"], "work_order");
    assert_eq!(pending[0]["operation"], "insert");
    assert_eq!(pending[0]["payload"]["title"], "Fix boiler");
    assert_eq!(pending[0]["retry_count"], 0);
    assert_eq!(pending[0]["max_retries"], 5);
}

#[test]
fn enqueue_with_explicit_id() {
    let ws = Workspace::new();
    ws.outbox()
        .args(["enqueue", "customer", "update", r#"{"id":"cu-1"}"#])
        .args(["--id", "offline-1"])
        .assert()
        .success()
        .stdout("offline-1\n");
}

#[test]
fn enqueue_refuses_an_id_already_queued() {
    let ws = Workspace::with_remote("http://127.0.0.1:1");
    ws.outbox()
        .args(["enqueue", "work_order", "insert", r#"{"title":"a"}"#])
        .args(["--id", "fixed"])
        .assert()
        .success();
    ws.outbox().arg("replay").assert().success();

    ws.outbox()
        .args(["enqueue", "work_order", "insert", r#"{"title":"b"}"#])
        .args(["--id", "fixed"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("pending mutation already queued: fixed"));

    let pending = ws.pending_json();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0]["retry_count"], 1);
    assert_eq!(pending[0]["payload"]["title"], "a");
}

#[parameterized(
    unknown_kind = { "widget", "insert", "{}" },
    unknown_operation = { "invoice", "upsert", "{}" },
    malformed_json = { "invoice", "insert", "{not json" },
)]
fn enqueue_rejects_bad_arguments(kind: &str, operation: &str, payload: &str) {
    let ws = Workspace::new();
    ws.outbox()
        .args(["enqueue", kind, operation, payload])
        .assert()
        .failure();
    assert!(ws.pending_json().is_empty());
}

#[test]
fn queue_survives_restart() {
    let ws = Workspace::new();
    let first = ws.enqueue("invoice", "insert", "{}");
    let second = ws.enqueue("customer", "insert", "{}");

    // Each invocation is a fresh process over the same database file.
    let ids: Vec<_> = ws
        .pending_json()
        .iter()
        .map(|r| r["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec![first, second]);
}

#[test]
fn pending_filters_by_kind() {
    let ws = Workspace::new();
    ws.enqueue("invoice", "insert", "{}");
    let wanted = ws.enqueue("property", "insert", "{}");

    ws.outbox()
        .args(["pending", "-k", "properties"])
        .assert()
        .success()
        .stdout(predicate::str::contains(&wanted))
        .stdout(predicate::str::contains("invoice").not());
}

#[test]
fn status_reports_counts() {
    let ws = Workspace::new();
    ws.enqueue("invoice", "insert", "{}");
    ws.enqueue("invoice", "insert", "{}");
    ws.enqueue("customer", "insert", "{}");

    ws.outbox()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("pending: 3"))
        .stdout(predicate::str::contains("  customer: 1"))
        .stdout(predicate::str::contains("  invoice: 2"))
        .stdout(predicate::str::contains("remote: not configured"))
        .stdout(predicate::str::contains("background wake: unsupported"));
}

#[test]
fn status_json() {
    let ws = Workspace::new();
    ws.enqueue("work_order", "insert", "{}");

    let output = ws
        .outbox()
        .args(["status", "-o", "json"])
        .output()
        .unwrap();
    let status: Value = serde_json::from_slice(&output.stdout).unwrap();

    assert_eq!(status["pending"], 1);
    assert_eq!(status["by_kind"]["work_order"], 1);
    assert_eq!(status["unsynced_drafts"], 0);
    assert_eq!(status["remote"], Value::Null);
}

// =============================================================================
// Remove and clear
// =============================================================================

#[test]
fn remove_drops_one_record() {
    let ws = Workspace::new();
    let keep = ws.enqueue("invoice", "insert", "{}");
    let drop = ws.enqueue("invoice", "insert", "{}");

    ws.outbox()
        .args(["remove", &drop])
        .assert()
        .success()
        .stdout(format!("removed {drop}\n"));

    let pending = ws.pending_json();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0]["id"], keep);
}

#[test]
fn remove_unknown_fails() {
    let ws = Workspace::new();
    ws.outbox()
        .args(["remove", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("pending mutation not found: nope"));
}

#[test]
fn clear_requires_force() {
    let ws = Workspace::new();
    ws.enqueue("invoice", "insert", "{}");

    ws.outbox()
        .arg("clear")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
    assert_eq!(ws.pending_json().len(), 1);

    ws.outbox()
        .args(["clear", "--force"])
        .assert()
        .success()
        .stdout("cleared 1 pending mutation(s)\n");
    assert!(ws.pending_json().is_empty());
}

#[test]
fn clear_empty_queue_needs_no_force() {
    let ws = Workspace::new();
    ws.outbox()
        .arg("clear")
        .assert()
        .success()
        .stdout("cleared 0 pending mutation(s)\n");
}

// =============================================================================
// Replay
// =============================================================================

#[test]
fn replay_without_remote_fails_with_hint() {
    let ws = Workspace::new();
    ws.enqueue("invoice", "insert", "{}");

    ws.outbox()
        .arg("replay")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no remote configured"))
        .stderr(predicate::str::contains("[remote] url"));
    assert_eq!(ws.pending_json().len(), 1);
}

#[test]
fn replay_unreachable_remote_keeps_records() {
    let ws = Workspace::with_remote("http://127.0.0.1:1");
    ws.enqueue("work_order", "insert", r#"{"title":"a"}"#);

    ws.outbox()
        .arg("replay")
        .assert()
        .success()
        .stdout("replayed: 0 applied, 0 abandoned\n");

    let pending = ws.pending_json();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0]["retry_count"], 1);
    assert!(pending[0]["last_error"].is_string());
}

#[test]
fn replay_abandons_invalid_payload() {
    let ws = Workspace::with_remote("http://127.0.0.1:1");
    let id = ws.enqueue("customer", "update", r#"{"phone":"555"}"#);

    ws.outbox()
        .arg("replay")
        .assert()
        .success()
        .stdout(predicate::str::contains("0 applied, 1 abandoned"))
        .stdout(predicate::str::contains(format!("abandoned {id}")))
        .stdout(predicate::str::contains("validation error"));
    assert!(ws.pending_json().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn replay_applies_against_remote() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/work_orders"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/customers"))
        .and(query_param("id", "eq.cu-1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let ws = Workspace::with_remote(&server.uri());
    ws.enqueue("work_order", "insert", r#"{"title":"a"}"#);
    ws.enqueue("customer", "update", r#"{"id":"cu-1","phone":"555"}"#);

    let output = ws
        .outbox()
        .args(["replay", "-o", "json"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{output:?}");
    let summary: Value = serde_json::from_slice(&output.stdout).unwrap();

    assert_eq!(summary["successful"], 2);
    assert_eq!(summary["failed"], 0);
    assert!(ws.pending_json().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn replay_keeps_rejected_records_for_retry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let ws = Workspace::with_remote(&server.uri());
    ws.enqueue("invoice", "insert", "{}");

    ws.outbox()
        .arg("replay")
        .assert()
        .success()
        .stdout("replayed: 0 applied, 0 abandoned\n");

    ws.outbox()
        .arg("pending")
        .assert()
        .success()
        .stdout(predicate::str::contains("attempts 1/5"))
        .stdout(predicate::str::contains("HTTP 503"));
}
