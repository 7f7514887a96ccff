// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use crate::sync::engine::SyncSettings;
use crate::sync::remote::RemoteError;
use crate::sync::status::QueueCounts;
use crate::sync::test_helpers::{make_op, FakeRemote};
use rp_core::{MemoryPersistence, OperationStatus};
use yare::parameterized;

fn engine() -> (SyncEngine, Arc<FakeRemote>) {
    let remote = FakeRemote::new();
    let engine = SyncEngine::open(
        Box::new(MemoryPersistence::new()),
        "test",
        remote.clone(),
        SyncSettings::default(),
    )
    .unwrap();
    (engine, remote)
}

fn config(interval: SyncInterval) -> SchedulerConfig {
    SchedulerConfig {
        interval,
        auto_retry_transient: true,
    }
}

/// Waits (in virtual time) until the counts satisfy `pred`.
async fn wait_for(engine: &SyncEngine, pred: impl FnMut(&QueueCounts) -> bool) {
    let mut rx = engine.subscribe();
    tokio::time::timeout(Duration::from_secs(3600), rx.wait_for(pred))
        .await
        .unwrap()
        .unwrap();
}

fn status(engine: &SyncEngine, id: &str) -> OperationStatus {
    engine.get_operation(id).unwrap().status
}

#[parameterized(
    thirty = { 30, SyncInterval::Every30s },
    sixty = { 60, SyncInterval::Every60s },
    five_minutes = { 300, SyncInterval::Every5m },
    manual = { -1, SyncInterval::Manual },
)]
fn interval_from_secs(secs: i64, expected: SyncInterval) {
    assert_eq!(SyncInterval::from_secs(secs).unwrap(), expected);
    assert_eq!(expected.as_secs(), secs);
}

#[parameterized(
    unsupported = { 45 },
    zero = { 0 },
    negative = { -2 },
)]
fn interval_rejects_other_values(secs: i64) {
    assert!(matches!(
        SyncInterval::from_secs(secs),
        Err(Error::InvalidInterval(v)) if v == secs
    ));
}

#[test]
fn interval_serde_uses_seconds() {
    let parsed: SyncInterval = serde_json::from_str("300").unwrap();
    assert_eq!(parsed, SyncInterval::Every5m);
    assert_eq!(serde_json::to_string(&SyncInterval::Manual).unwrap(), "-1");
    assert!(serde_json::from_str::<SyncInterval>("45").is_err());
}

#[test]
fn interval_display() {
    assert_eq!(SyncInterval::default().to_string(), "every 60s");
    assert_eq!(SyncInterval::Manual.to_string(), "manual");
    assert_eq!(SyncInterval::Manual.period(), None);
}

#[test]
fn gate_is_single_flight() {
    let gate = DrainGate::new(true);

    let permit = gate.admit();
    assert!(matches!(permit, Admission::Granted(_)));
    assert!(gate.is_syncing());
    assert!(matches!(gate.admit(), Admission::Coalesced));

    drop(permit);
    assert!(!gate.is_syncing());
    assert!(matches!(gate.admit(), Admission::Granted(_)));
}

#[test]
fn gate_suppresses_while_offline() {
    let gate = DrainGate::new(false);
    assert!(matches!(gate.admit(), Admission::Suppressed));
    assert!(!gate.is_syncing());

    assert!(!gate.set_online(true));
    assert!(matches!(gate.admit(), Admission::Granted(_)));
}

#[tokio::test(start_paused = true)]
async fn drains_on_start_when_online() {
    let (engine, _remote) = engine();
    engine.add_operation(make_op("a", 1)).unwrap();
    let (_tx, rx) = watch::channel(true);

    let (handle, task) = Scheduler::spawn(engine.clone(), config(SyncInterval::Manual), rx);
    wait_for(&engine, |c| c.completed == 1).await;

    handle.shutdown();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn timer_drains_each_period() {
    let (engine, _remote) = engine();
    let (_tx, rx) = watch::channel(true);
    let (handle, task) = Scheduler::spawn(engine.clone(), config(SyncInterval::Every30s), rx);
    tokio::time::sleep(Duration::from_millis(1)).await;

    engine.add_operation(make_op("a", 1)).unwrap();
    tokio::time::sleep(Duration::from_secs(29)).await;
    assert_eq!(status(&engine, "a"), OperationStatus::Pending);

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(status(&engine, "a"), OperationStatus::Completed);

    handle.shutdown();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn manual_interval_never_fires() {
    let (engine, remote) = engine();
    let (_tx, rx) = watch::channel(true);
    let (handle, task) = Scheduler::spawn(engine.clone(), config(SyncInterval::Manual), rx);
    tokio::time::sleep(Duration::from_millis(1)).await;

    engine.add_operation(make_op("a", 1)).unwrap();
    tokio::time::sleep(Duration::from_secs(3600)).await;

    assert_eq!(status(&engine, "a"), OperationStatus::Pending);
    assert!(remote.calls().is_empty());

    handle.shutdown();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn offline_start_waits_for_connectivity() {
    let (engine, remote) = engine();
    engine.add_operation(make_op("a", 1)).unwrap();
    let (tx, rx) = watch::channel(false);

    let (handle, task) = Scheduler::spawn(engine.clone(), config(SyncInterval::Every30s), rx);
    tokio::time::sleep(Duration::from_secs(120)).await;
    assert!(!engine.is_online());
    assert!(remote.calls().is_empty());

    tx.send(true).unwrap();
    wait_for(&engine, |c| c.completed == 1).await;
    assert!(engine.is_online());

    handle.shutdown();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn reconnect_requeues_transient_failures_only() {
    let (engine, remote) = engine();
    engine.add_operation(make_op("flaky", 1)).unwrap();
    engine.add_operation(make_op("rejected", 2)).unwrap();
    remote.fail("flaky", RemoteError::Transient("reset".into()));
    remote.fail("rejected", RemoteError::Permanent("invalid".into()));
    engine.process_queue().await.unwrap();

    let (tx, rx) = watch::channel(false);
    let (handle, task) = Scheduler::spawn(engine.clone(), config(SyncInterval::Manual), rx);
    tokio::time::sleep(Duration::from_millis(1)).await;

    remote.clear_failure("flaky");
    remote.clear_failure("rejected");
    tx.send(true).unwrap();
    wait_for(&engine, |c| c.completed == 1).await;

    assert_eq!(status(&engine, "flaky"), OperationStatus::Completed);
    assert_eq!(status(&engine, "rejected"), OperationStatus::Failed);

    handle.shutdown();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn reconnect_without_auto_retry_leaves_failures() {
    let (engine, remote) = engine();
    engine.add_operation(make_op("flaky", 1)).unwrap();
    remote.fail("flaky", RemoteError::Transient("reset".into()));
    engine.process_queue().await.unwrap();

    let (tx, rx) = watch::channel(false);
    let config = SchedulerConfig {
        interval: SyncInterval::Manual,
        auto_retry_transient: false,
    };
    let (handle, task) = Scheduler::spawn(engine.clone(), config, rx);
    tokio::time::sleep(Duration::from_millis(1)).await;

    remote.clear_failure("flaky");
    tx.send(true).unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(status(&engine, "flaky"), OperationStatus::Failed);

    handle.shutdown();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn sync_now_drains_through_the_handle() {
    let (engine, _remote) = engine();
    let (_tx, rx) = watch::channel(true);
    let (handle, task) = Scheduler::spawn(engine.clone(), config(SyncInterval::Manual), rx);
    tokio::time::sleep(Duration::from_millis(1)).await;

    engine.add_operation(make_op("a", 1)).unwrap();
    assert!(handle.sync_now());
    wait_for(&engine, |c| c.completed == 1).await;

    handle.shutdown();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn losing_connectivity_suppresses_timer_drains() {
    let (engine, remote) = engine();
    let (tx, rx) = watch::channel(true);
    let (handle, task) = Scheduler::spawn(engine.clone(), config(SyncInterval::Every30s), rx);
    tokio::time::sleep(Duration::from_millis(1)).await;

    tx.send(false).unwrap();
    engine.add_operation(make_op("a", 1)).unwrap();
    tokio::time::sleep(Duration::from_secs(95)).await;

    assert_eq!(status(&engine, "a"), OperationStatus::Pending);
    assert!(remote.calls().is_empty());

    handle.shutdown();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn shutdown_lets_running_drain_finish() {
    let (engine, remote) = engine();
    engine.add_operation(make_op("a", 1)).unwrap();
    remote.pause();
    let (_tx, rx) = watch::channel(true);

    let (handle, mut task) = Scheduler::spawn(engine.clone(), config(SyncInterval::Manual), rx);
    remote.wait_entered().await;
    handle.shutdown();

    let early = tokio::time::timeout(Duration::from_secs(5), &mut task).await;
    assert!(early.is_err(), "scheduler stopped before its drain finished");

    remote.release(1);
    task.await.unwrap();
    assert_eq!(status(&engine, "a"), OperationStatus::Completed);
    assert!(!engine.is_syncing());
}
