// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Rust specs for the `outbox draft` subcommands and draft recovery.

#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::path::PathBuf;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use similar_asserts::assert_eq;
use tempfile::TempDir;
use wiremock::matchers::{body_json, method, path, query_param};
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

    fn config_path(&self) -> PathBuf {
        self.temp.path().join("config.toml")
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

    fn save(&self, id: &str, state: &str, updated_at: &str) {
        self.outbox()
            .args(["draft", "save", id, state])
            .args(["--owner", "u-1", "--template", "work_order"])
            .args(["--updated-at", updated_at])
            .assert()
            .success();
    }

    fn show_json(&self, id: &str) -> Value {
        let output = self
            .outbox()
            .args(["draft", "show", id, "-o", "json"])
            .output()
            .unwrap();
        assert!(output.status.success(), "{output:?}");
        serde_json::from_slice(&output.stdout).unwrap()
    }

    fn list_json(&self) -> Vec<Value> {
        let output = self
            .outbox()
            .args(["draft", "list", "-o", "json"])
            .output()
            .unwrap();
        serde_json::from_slice(&output.stdout).unwrap()
    }
}

// =============================================================================
// Save, show, list
// =============================================================================

#[test]
fn save_then_show() {
    let ws = Workspace::new();
    ws.outbox()
        .args(["draft", "save", "wo-1", r#"{"notes":"half done"}"#])
        .args(["--owner", "u-1", "--template", "work_order"])
        .args(["--updated-at", "2026-03-01T10:00:00Z"])
        .assert()
        .success()
        .stdout("saved wo-1 locally (unsynced)\n");

    let draft = ws.show_json("wo-1");
    assert_eq!(draft["id"], "wo-1");
    assert_eq!(draft["state"], json!({"notes": "half done"}));
    assert_eq!(draft["synced"], false);
    assert_eq!(draft["owner_user_id"], "u-1");
    assert_eq!(draft["template"], "work_order");

    ws.outbox()
        .args(["draft", "show", "wo-1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("updated: 2026-03-01 10:00:00.000"))
        .stdout(predicate::str::contains("synced: no"));
}

#[test]
fn save_overwrites_previous_snapshot() {
    let ws = Workspace::new();
    ws.save("wo-1", r#"{"step":1}"#, "1000");
    ws.save("wo-1", r#"{"step":2}"#, "2000");

    assert_eq!(ws.show_json("wo-1")["state"], json!({"step": 2}));
    assert_eq!(ws.list_json().len(), 1);
}

#[test]
fn list_shows_only_unsynced_oldest_first() {
    let ws = Workspace::new();
    ws.save("b", "{}", "2000");
    ws.save("a", "{}", "1000");
    ws.save("c", "{}", "3000");
    ws.outbox()
        .args(["draft", "mark-synced", "c"])
        .assert()
        .success()
        .stdout("marked c synced\n");

    let ids: Vec<_> = ws.list_json().iter().map(|d| d["id"].clone()).collect();
    assert_eq!(ids, vec![json!("a"), json!("b")]);
}

#[parameterized(
    show = { &["draft", "show", "ghost"] },
    mark_synced = { &["draft", "mark-synced", "ghost"] },
    delete = { &["draft", "delete", "ghost"] },
    resolve = { &["draft", "resolve", "ghost", "restore"] },
)]
fn missing_draft_fails(args: &[&str]) {
    Workspace::new()
        .outbox()
        .args(args)
        .assert()
        .failure()
        .stderr(predicate::str::contains("draft not found: ghost"));
}

#[test]
fn delete_removes_draft() {
    let ws = Workspace::new();
    ws.save("wo-1", "{}", "1000");

    ws.outbox()
        .args(["draft", "delete", "wo-1"])
        .assert()
        .success();
    ws.outbox()
        .args(["draft", "show", "wo-1"])
        .assert()
        .failure();
}

// =============================================================================
// Conflict check and resolution
// =============================================================================

#[test]
fn check_newer_local_offers_recovery() {
    let ws = Workspace::new();
    ws.save("wo-1", r#"{"notes":"offline edit"}"#, "2026-03-01T10:05:00Z");

    let output = ws
        .outbox()
        .args(["draft", "check", "wo-1", "-o", "json"])
        .args(["--remote-updated-at", "2026-03-01T10:00:00Z"])
        .output()
        .unwrap();
    let result: Value = serde_json::from_slice(&output.stdout).unwrap();

    assert_eq!(result["status"], "recovery_available");
    assert_eq!(result["draft"]["id"], "wo-1");
    assert_eq!(result["draft"]["state"]["notes"], "offline edit");
}

#[parameterized(
    remote_newer = { "2026-03-01T10:10:00Z" },
    same_instant = { "2026-03-01T10:05:00Z" },
)]
fn check_without_newer_local_is_no_conflict(remote: &str) {
    let ws = Workspace::new();
    ws.save("wo-1", "{}", "2026-03-01T10:05:00Z");

    ws.outbox()
        .args(["draft", "check", "wo-1", "--remote-updated-at", remote])
        .assert()
        .success()
        .stdout("no conflict\n");
}

#[test]
fn check_absent_remote_offers_recovery() {
    let ws = Workspace::new();
    ws.save("wo-1", "{}", "1000");

    ws.outbox()
        .args(["draft", "check", "wo-1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("recovery available"))
        .stdout(predicate::str::contains("(absent)"));
}

#[test]
fn check_synced_or_missing_draft_is_no_conflict() {
    let ws = Workspace::new();
    ws.save("wo-1", "{}", "5000");
    ws.outbox()
        .args(["draft", "mark-synced", "wo-1"])
        .assert()
        .success();

    for id in ["wo-1", "ghost"] {
        ws.outbox()
            .args(["draft", "check", id, "--remote-updated-at", "1000"])
            .assert()
            .success()
            .stdout("no conflict\n");
    }
}

#[test]
fn resolve_restore_keeps_state_unsynced() {
    let ws = Workspace::new();
    ws.save("wo-1", r#"{"notes":"keep me"}"#, "1000");

    ws.outbox()
        .args(["draft", "resolve", "wo-1", "restore"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("restored wo-1"));

    let draft = ws.show_json("wo-1");
    assert_eq!(draft["state"]["notes"], "keep me");
    assert_eq!(draft["synced"], false);
    assert_ne!(draft["updated_at"], "1970-01-01T00:00:01Z");
}

#[test]
fn resolve_discard_removes_draft() {
    let ws = Workspace::new();
    ws.save("wo-1", "{}", "1000");

    ws.outbox()
        .args(["draft", "resolve", "wo-1", "discard"])
        .assert()
        .success()
        .stdout("discarded wo-1\n");
    assert!(ws.list_json().is_empty());
}

// =============================================================================
// Save with sync
// =============================================================================

#[test]
fn save_with_sync_queues_linked_mutation() {
    let ws = Workspace::new();
    ws.outbox()
        .args(["draft", "save", "wo-1", r#"{"status":"done"}"#])
        .args(["--owner", "u-1", "--template", "work-orders"])
        .args(["--updated-at", "1000", "--sync", "update"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("saved wo-1 locally, queued sync-"));

    let output = ws
        .outbox()
        .args(["pending", "-o", "json"])
        .output()
        .unwrap();
    let pending: Vec<Value> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0]["entity_kind"], "work_order");
    assert_eq!(pending[0]["operation"], "update");
    assert_eq!(pending[0]["payload"], json!({"status": "done", "id": "wo-1"}));
    assert_eq!(pending[0]["draft"]["id"], "wo-1");

    ws.outbox()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("unsynced drafts: 1"));
}

#[test]
fn save_with_sync_rejects_unknown_template() {
    let ws = Workspace::new();
    ws.outbox()
        .args(["draft", "save", "f-1", "{}"])
        .args(["--owner", "u-1", "--template", "safety-checklist"])
        .args(["--sync", "insert"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("safety-checklist"));
}

#[tokio::test(flavor = "multi_thread")]
async fn replay_marks_linked_draft_synced() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/work_orders"))
        .and(query_param("id", "eq.wo-1"))
        .and(body_json(json!({"status": "done"})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let ws = Workspace::new();
    std::fs::write(
        ws.config_path(),
        format!("[remote]\nurl = \"{}\"\n", server.uri()),
    )
    .unwrap();
    ws.outbox()
        .args(["draft", "save", "wo-1", r#"{"status":"done"}"#])
        .args(["--owner", "u-1", "--template", "work_order"])
        .args(["--sync", "update"])
        .assert()
        .success();

    ws.outbox()
        .arg("replay")
        .assert()
        .success()
        .stdout("replayed: 1 applied, 0 abandoned\n");

    assert_eq!(ws.show_json("wo-1")["synced"], true);
    assert!(ws.list_json().is_empty());
}
