// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Queue counts: `status`.

#![allow(clippy::unwrap_used)]

#[path = "common.rs"]
mod common;

use common::*;
use common::assert_eq;

fn status_json(ws: &Workspace, extra: &[&str]) -> serde_json::Value {
    let out = ws
        .repsync()
        .args(extra)
        .args(["status", "-o", "json"])
        .run();
    assert!(out.status.success(), "status failed: {out:?}");
    serde_json::from_slice(&out.stdout).unwrap()
}

#[test]
fn empty_queue_has_zero_counts() {
    let ws = Workspace::new();
    let json = status_json(&ws, &[]);
    for field in ["pending", "syncing", "failed", "completed", "queue_length"] {
        assert_eq!(json[field], 0, "{field}");
    }
}

#[test]
fn counts_follow_the_queue() {
    let ws = Workspace::new();
    ws.add("w1", "{}");
    ws.add("w2", "{}");
    ws.add("w1", r#"{"again":true}"#);

    let json = status_json(&ws, &[]);
    assert_eq!(json["pending"], 2);
    assert_eq!(json["queue_length"], 2);
}

#[test]
fn offline_flag_is_reported() {
    let ws = Workspace::new();
    assert_eq!(status_json(&ws, &["--offline"])["online"], false);
}

#[test]
fn text_output_summarizes() {
    let ws = Workspace::new();
    ws.add("w1", "{}");
    ws.repsync()
        .arg("status")
        .output()
        .success()
        .stdout(predicate::str::contains(
            "1 queued: 1 pending, 0 syncing, 0 failed, 0 completed",
        ));
}

#[test]
fn explicit_config_must_exist() {
    let ws = Workspace::new();
    ws.repsync()
        .args(["--config", "/nonexistent/repsync.toml", "status"])
        .output()
        .failure()
        .stderr(predicate::str::contains("failed to read config"));
}

#[test]
fn unknown_config_keys_are_rejected() {
    let ws = Workspace::with_config("colour = true");
    ws.repsync()
        .arg("status")
        .output()
        .failure()
        .stderr(predicate::str::contains("invalid config"));
}

#[test]
fn unsupported_interval_is_rejected() {
    let ws = Workspace::with_config("[sync]\ninterval_secs = 45");
    ws.repsync()
        .arg("status")
        .output()
        .failure()
        .stderr(predicate::str::contains("invalid config"));
}
