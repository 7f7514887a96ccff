// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Failure handling: `retry`, `discard`, and `clear`.
//!
//! The workspace remote is unreachable, so every drain fails transiently.

#![allow(clippy::unwrap_used)]

#[path = "common.rs"]
mod common;

use common::*;
use common::assert_eq;

/// Queues `ids` and runs one failing sync.
fn failed_workspace(ids: &[&str]) -> Workspace {
    let ws = Workspace::new();
    for id in ids {
        ws.add(id, "{}");
    }
    ws.repsync().arg("sync").output().failure();
    ws
}

#[test]
fn retry_requeues_and_counts_attempts() {
    let ws = failed_workspace(&["w1"]);
    ws.repsync()
        .arg("retry")
        .output()
        .failure()
        .stdout(predicate::str::contains("requeued 1 operation(s)"));

    let op = &ws.queue_json()["operations"][0];
    assert_eq!(op["status"], "failed");
    assert_eq!(op["retryCount"], 1);
    assert_eq!(op["failure"], "transient");
}

#[test]
fn retry_while_offline_leaves_operation_pending() {
    let ws = failed_workspace(&["w1"]);
    ws.repsync()
        .args(["--offline", "retry", "w1"])
        .output()
        .success()
        .stdout(predicate::str::contains("offline"));
    assert_eq!(ws.status_of("w1"), "pending");
}

#[test]
fn retry_limit_is_enforced() {
    let ws = Workspace::with_config("[sync]\nmax_retries = 1");
    ws.add("w1", "{}");
    ws.repsync().arg("sync").output().failure();
    ws.repsync().arg("retry").output().failure();

    ws.repsync()
        .args(["retry", "w1"])
        .output()
        .failure()
        .stderr(predicate::str::contains("retry limit reached"));
}

#[test]
fn retry_unknown_id_fails() {
    let ws = Workspace::new();
    ws.repsync()
        .args(["retry", "ghost"])
        .output()
        .failure()
        .stderr(predicate::str::contains("ghost"));
}

#[test]
fn discard_removes_failed_operation() {
    let ws = failed_workspace(&["w1", "w2"]);
    ws.repsync()
        .args(["discard", "w1"])
        .output()
        .success()
        .stdout(predicate::str::contains("discarded w1"));
    assert_eq!(ws.queue_ids(), ["w2"]);
}

#[test]
fn discard_all_failed_empties_queue() {
    let ws = failed_workspace(&["w1", "w2"]);
    ws.repsync()
        .args(["discard", "--all-failed"])
        .output()
        .success()
        .stdout(predicate::str::contains("discarded 2"));
    assert!(ws.queue_ids().is_empty());
}

#[test]
fn discard_pending_is_refused() {
    let ws = Workspace::new();
    ws.add("w1", "{}");
    ws.repsync().args(["discard", "w1"]).output().failure();
    assert_eq!(ws.status_of("w1"), "pending");
}

#[test]
fn discard_needs_a_target() {
    let ws = Workspace::new();
    ws.repsync()
        .arg("discard")
        .output()
        .failure()
        .stderr(predicate::str::contains("nothing to discard"));
}

#[test]
fn clear_keeps_uncompleted_operations() {
    let ws = failed_workspace(&["w1"]);
    ws.add("w2", "{}");
    ws.repsync()
        .arg("clear")
        .output()
        .success()
        .stdout(predicate::str::contains("removed 0"));
    assert_eq!(ws.queue_ids(), ["w1", "w2"]);
}
