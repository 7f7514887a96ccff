// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Decides when the queue drains.
//!
//! Drains are triggered by connectivity coming back, a periodic timer, an
//! explicit "sync now", or a retry request. Every trigger passes through a
//! [`DrainGate`]: while offline it is suppressed, and while a drain is
//! running it is coalesced into that drain (dropped, not queued).

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rp_core::{Error, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::engine::SyncEngine;
use super::processor::DrainReport;

/// How often the timer trigger fires.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum SyncInterval {
    Every30s,
    #[default]
    Every60s,
    Every5m,
    /// Timer disabled; other triggers still apply.
    Manual,
}

impl SyncInterval {
    /// Parses the settings value: 30, 60, 300, or -1 for manual.
    pub fn from_secs(secs: i64) -> Result<Self> {
        match secs {
            30 => Ok(SyncInterval::Every30s),
            60 => Ok(SyncInterval::Every60s),
            300 => Ok(SyncInterval::Every5m),
            -1 => Ok(SyncInterval::Manual),
            other => Err(Error::InvalidInterval(other)),
        }
    }

    pub fn as_secs(&self) -> i64 {
        match self {
            SyncInterval::Every30s => 30,
            SyncInterval::Every60s => 60,
            SyncInterval::Every5m => 300,
            SyncInterval::Manual => -1,
        }
    }

    /// Timer period, or `None` for manual.
    pub fn period(&self) -> Option<Duration> {
        u64::try_from(self.as_secs()).ok().map(Duration::from_secs)
    }
}

impl TryFrom<i64> for SyncInterval {
    type Error = Error;

    fn try_from(secs: i64) -> Result<Self> {
        Self::from_secs(secs)
    }
}

impl From<SyncInterval> for i64 {
    fn from(interval: SyncInterval) -> Self {
        interval.as_secs()
    }
}

impl fmt::Display for SyncInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.period() {
            Some(period) => write!(f, "every {}s", period.as_secs()),
            None => write!(f, "manual"),
        }
    }
}

/// Why a drain was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    ConnectivityRestored,
    Timer,
    SyncNow,
    Retry,
}

impl Trigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trigger::ConnectivityRestored => "connectivity",
            Trigger::Timer => "timer",
            Trigger::SyncNow => "sync_now",
            Trigger::Retry => "retry",
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened to a trigger.
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerOutcome {
    Drained(DrainReport),
    /// A drain was already running.
    Coalesced,
    /// Offline.
    Suppressed,
}

impl TriggerOutcome {
    pub fn report(&self) -> Option<&DrainReport> {
        match self {
            TriggerOutcome::Drained(report) => Some(report),
            _ => None,
        }
    }

    pub fn into_report(self) -> Option<DrainReport> {
        match self {
            TriggerOutcome::Drained(report) => Some(report),
            _ => None,
        }
    }
}

/// Single-flight and online flags shared by every trigger source.
#[derive(Debug)]
pub struct DrainGate {
    syncing: AtomicBool,
    online: AtomicBool,
}

/// Result of asking the gate for permission to drain.
#[derive(Debug)]
pub enum Admission {
    Granted(DrainPermit),
    Coalesced,
    Suppressed,
}

impl DrainGate {
    pub fn new(online: bool) -> Arc<Self> {
        Arc::new(DrainGate {
            syncing: AtomicBool::new(false),
            online: AtomicBool::new(online),
        })
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::Acquire)
    }

    /// Records connectivity. Returns the previous value.
    pub fn set_online(&self, online: bool) -> bool {
        self.online.swap(online, Ordering::AcqRel)
    }

    pub fn is_syncing(&self) -> bool {
        self.syncing.load(Ordering::Acquire)
    }

    pub fn admit(self: &Arc<Self>) -> Admission {
        if !self.is_online() {
            return Admission::Suppressed;
        }
        if self
            .syncing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Admission::Coalesced;
        }
        Admission::Granted(DrainPermit {
            gate: Arc::clone(self),
        })
    }
}

/// Held for the duration of a drain; releases the gate on drop.
#[derive(Debug)]
pub struct DrainPermit {
    gate: Arc<DrainGate>,
}

impl Drop for DrainPermit {
    fn drop(&mut self) {
        self.gate.syncing.store(false, Ordering::Release);
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SchedulerConfig {
    pub interval: SyncInterval,
    /// Requeue transient failures when connectivity comes back.
    pub auto_retry_transient: bool,
}

/// Sends triggers to a running scheduler.
#[derive(Clone)]
pub struct SchedulerHandle {
    tx: mpsc::Sender<Trigger>,
    cancel: CancellationToken,
}

impl SchedulerHandle {
    /// Requests an immediate drain. Returns false if one is already queued.
    pub fn sync_now(&self) -> bool {
        self.request(Trigger::SyncNow)
    }

    pub fn request(&self, trigger: Trigger) -> bool {
        self.tx.try_send(trigger).is_ok()
    }

    /// Stops the scheduler loop. A running drain is allowed to finish.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

/// Background loop turning triggers into drains.
pub struct Scheduler {
    engine: SyncEngine,
    config: SchedulerConfig,
    connectivity: watch::Receiver<bool>,
    triggers: mpsc::Receiver<Trigger>,
    cancel: CancellationToken,
    drains: JoinSet<()>,
}

impl Scheduler {
    /// Starts the scheduler on the current runtime.
    pub fn spawn(
        engine: SyncEngine,
        config: SchedulerConfig,
        connectivity: watch::Receiver<bool>,
    ) -> (SchedulerHandle, JoinHandle<()>) {
        let (tx, triggers) = mpsc::channel(1);
        let cancel = CancellationToken::new();
        let scheduler = Scheduler {
            engine,
            config,
            connectivity,
            triggers,
            cancel: cancel.clone(),
            drains: JoinSet::new(),
        };
        let task = tokio::spawn(scheduler.run());
        (SchedulerHandle { tx, cancel }, task)
    }

    async fn run(mut self) {
        let mut timer = self.config.interval.period().map(|period| {
            let mut timer = tokio::time::interval_at(Instant::now() + period, period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
            timer
        });
        let mut watching = true;
        let mut listening = true;

        let online = *self.connectivity.borrow_and_update();
        self.engine.set_online(online);
        info!(interval = %self.config.interval, online, "scheduler started");
        if online {
            self.spawn_drain(Trigger::ConnectivityRestored);
        }

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,

                changed = self.connectivity.changed(), if watching => {
                    if changed.is_err() {
                        debug!("connectivity source closed");
                        watching = false;
                        continue;
                    }
                    let online = *self.connectivity.borrow_and_update();
                    self.on_connectivity(online);
                }

                _ = next_tick(&mut timer) => self.spawn_drain(Trigger::Timer),

                trigger = self.triggers.recv(), if listening => match trigger {
                    Some(trigger) => self.spawn_drain(trigger),
                    None => listening = false,
                },

                Some(_) = self.drains.join_next(), if !self.drains.is_empty() => {}
            }
        }

        // Let an in-flight drain finish rather than abort it
        while self.drains.join_next().await.is_some() {}
        info!("scheduler stopped");
    }

    fn on_connectivity(&mut self, online: bool) {
        let was_online = self.engine.set_online(online);
        match (was_online, online) {
            (false, true) => {
                info!("connectivity restored");
                if self.config.auto_retry_transient {
                    if let Err(e) = self.engine.requeue_transient() {
                        error!(error = %e, "failed to requeue transient failures");
                    }
                }
                self.spawn_drain(Trigger::ConnectivityRestored);
            }
            (true, false) => info!("connectivity lost, drains suspended"),
            _ => {}
        }
    }

    fn spawn_drain(&mut self, trigger: Trigger) {
        let engine = self.engine.clone();
        self.drains.spawn(async move {
            match engine.trigger(trigger).await {
                Ok(TriggerOutcome::Drained(report)) => {
                    debug!(%trigger, attempted = report.attempted, "drain complete");
                }
                Ok(TriggerOutcome::Coalesced) => debug!(%trigger, "drain already running"),
                Ok(TriggerOutcome::Suppressed) => debug!(%trigger, "offline, drain suppressed"),
                Err(e) => error!(%trigger, error = %e, "drain aborted"),
            }
        });
    }
}

async fn next_tick(timer: &mut Option<Interval>) {
    match timer {
        Some(timer) => {
            timer.tick().await;
        }
        None => std::future::pending().await,
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
