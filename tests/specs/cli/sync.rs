// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! One-shot drains against an unreachable remote.
//!
//! Successful round trips are covered by the rp-remote end-to-end tests.

#![allow(clippy::unwrap_used)]

#[path = "common.rs"]
mod common;

use common::*;
use common::assert_eq;

#[test]
fn empty_queue_has_nothing_to_sync() {
    let ws = Workspace::new();
    ws.repsync()
        .arg("sync")
        .output()
        .success()
        .stdout(predicate::str::contains("nothing to sync"));
}

#[test]
fn unreachable_remote_fails_transiently() {
    let ws = Workspace::new();
    ws.add("w1", "{}");
    ws.add("w2", "{}");

    ws.repsync()
        .arg("sync")
        .output()
        .failure()
        .stdout(predicate::str::contains("synced 0 of 2"))
        .stderr(predicate::str::contains("some operations failed"))
        .stderr(predicate::str::contains("repsync retry"));

    let queue = ws.queue_json();
    for op in queue["operations"].as_array().unwrap() {
        assert_eq!(op["status"], "failed");
        assert_eq!(op["failure"], "transient");
        assert!(op["lastError"].is_string());
    }
}

#[test]
fn sync_json_reports_each_operation() {
    let ws = Workspace::new();
    ws.add("w1", "{}");

    let out = ws.repsync().args(["sync", "-o", "json"]).run();
    assert!(!out.status.success());
    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(json["outcome"], "drained");
    assert_eq!(json["report"]["attempted"], 1);
    assert_eq!(json["report"]["failed"], 1);
    assert_eq!(json["report"]["results"][0]["id"], "w1");
    assert_eq!(json["report"]["results"][0]["kind"], "transient");
}

#[test]
fn offline_sync_is_suppressed() {
    let ws = Workspace::new();
    ws.add("w1", "{}");

    ws.repsync()
        .args(["--offline", "sync"])
        .output()
        .success()
        .stdout(predicate::str::contains("offline, operations stay queued"));
    assert_eq!(ws.status_of("w1"), "pending");
}

#[test]
fn failed_operations_are_skipped_by_later_syncs() {
    let ws = Workspace::new();
    ws.add("w1", "{}");
    ws.repsync().arg("sync").output().failure();

    ws.repsync()
        .arg("sync")
        .output()
        .success()
        .stdout(predicate::str::contains("nothing to sync"));
}

#[test]
fn new_write_to_failed_id_is_sent_again() {
    let ws = Workspace::new();
    ws.add("w1", "{}");
    ws.repsync().arg("sync").output().failure();

    ws.add("w1", r#"{"name":"fixed"}"#);
    assert_eq!(ws.status_of("w1"), "pending");
}
