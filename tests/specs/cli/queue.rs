// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Queueing writes: `add` and `queue`.

#![allow(clippy::unwrap_used)]

#[path = "common.rs"]
mod common;

use common::*;
use common::assert_eq;
use yare::parameterized;

#[test]
fn empty_queue_says_so() {
    let ws = Workspace::new();
    ws.repsync()
        .arg("queue")
        .output()
        .success()
        .stdout(predicate::str::contains("queue is empty"));
}

#[test]
fn distinct_ids_keep_insertion_order() {
    let ws = Workspace::new();
    for id in ["w3", "w1", "w2"] {
        ws.add(id, "{}");
    }
    assert_eq!(ws.queue_ids(), ["w3", "w1", "w2"]);
}

#[test]
fn same_id_keeps_only_latest_write_in_place() {
    let ws = Workspace::new();
    ws.add("w1", r#"{"name":"first"}"#);
    ws.add("w2", "{}");
    ws.repsync()
        .args(["add", "workouts:update", "w1", "-p", r#"{"name":"second"}"#])
        .output()
        .success()
        .stdout(predicate::str::contains("replaced"));

    let queue = ws.queue_json();
    let ops = queue["operations"].as_array().unwrap();
    assert_eq!(ops.len(), 2);
    assert_eq!(ops[0]["id"], "w1");
    // The remote never saw the insert, so the merged write still creates it
    assert_eq!(ops[0]["resourceType"], "workouts:insert");
    assert_eq!(ops[0]["payload"]["name"], "second");
}

#[test]
fn add_json_reports_outcome() {
    let ws = Workspace::new();
    let out = ws
        .repsync()
        .args(["add", "sets:insert", "s1", "-o", "json"])
        .run();
    assert!(out.status.success());
    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(json["id"], "s1");
    assert_eq!(json["resource_type"], "sets:insert");
    assert_eq!(json["outcome"], "queued");
}

#[test]
fn explicit_timestamp_is_stored() {
    let ws = Workspace::new();
    ws.repsync()
        .args(["add", "workouts:insert", "w1", "--created-at", "1700000000000"])
        .output()
        .success();
    assert_eq!(ws.queue_json()["operations"][0]["createdAt"], 1_700_000_000_000u64);
    ws.repsync()
        .arg("queue")
        .output()
        .success()
        .stdout(predicate::str::contains("2023-11-14T22:13:20.000Z"));
}

#[parameterized(
    missing_action = { "workouts" },
    unknown_action = { "workouts:upsert" },
    bad_resource = { "Work outs:insert" },
)]
fn invalid_resource_type_is_rejected(resource_type: &str) {
    let ws = Workspace::new();
    ws.repsync()
        .args(["add", resource_type, "w1"])
        .output()
        .failure()
        .stderr(predicate::str::contains("invalid"));
    assert!(!ws.queue_file().exists());
}

#[test]
fn invalid_payload_is_rejected_with_hint() {
    let ws = Workspace::new();
    ws.repsync()
        .args(["add", "workouts:insert", "w1", "-p", "{name"])
        .output()
        .failure()
        .stderr(predicate::str::contains("invalid payload"))
        .stderr(predicate::str::contains("hint:"));
    assert!(ws.queue_ids().is_empty());
}

#[test]
fn queue_filters_by_status() {
    let ws = Workspace::new();
    ws.add("w1", "{}");
    let out = ws
        .repsync()
        .args(["queue", "-s", "failed", "-o", "json"])
        .run();
    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(json["operations"].as_array().unwrap().len(), 0);
    assert_eq!(json["status_filter"], "failed");
}

#[test]
fn queue_survives_between_invocations_on_sqlite() {
    let ws = Workspace::with_config("storage = \"sqlite\"");
    ws.add("w1", "{}");
    ws.add("w2", "{}");
    assert!(ws.data_dir().join("queue.db").exists());
    assert_eq!(ws.queue_ids(), ["w1", "w2"]);
}

#[test]
fn corrupt_queue_file_starts_empty() {
    let ws = Workspace::new();
    std::fs::create_dir_all(ws.data_dir()).unwrap();
    std::fs::write(ws.queue_file(), b"{ not a queue").unwrap();

    assert!(ws.queue_ids().is_empty());
    ws.add("w1", "{}");
    assert_eq!(ws.queue_ids(), ["w1"]);
}

#[test]
fn users_have_separate_queues() {
    let ws = Workspace::new();
    ws.add("w1", "{}");

    let other = ws.data_dir().parent().unwrap().join("other.toml");
    let config = std::fs::read_to_string(ws.config_path())
        .unwrap()
        .replace("user_id = \"tester\"", "user_id = \"other\"");
    std::fs::write(&other, config).unwrap();

    let out = ws
        .repsync()
        .env("REPSYNC_CONFIG", &other)
        .args(["queue", "-o", "json"])
        .run();
    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert!(json["operations"].as_array().unwrap().is_empty());
}
