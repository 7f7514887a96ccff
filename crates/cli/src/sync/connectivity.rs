// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Connectivity detection for the scheduler.
//!
//! The monitor probes the remote and publishes online/offline on a `watch`
//! channel. While online it probes at a fixed interval; while offline it
//! backs off exponentially so a dead remote is not hammered.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::remote::RemoteDataService;

/// Probe cadence for the connectivity monitor.
#[derive(Debug, Clone)]
pub struct ConnectivityConfig {
    /// Delay between probes while online.
    pub probe_interval: Duration,
    /// First retry delay after going offline.
    pub initial_delay: Duration,
    /// Cap on the offline backoff.
    pub max_delay: Duration,
    /// A probe slower than this counts as a failure.
    pub probe_timeout: Duration,
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            probe_interval: Duration::from_secs(5),
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(30),
            probe_timeout: Duration::from_secs(5),
        }
    }
}

/// Delay before the next offline probe: doubled, capped at `max`.
pub fn next_delay(current: Duration, max: Duration) -> Duration {
    current.saturating_mul(2).min(max)
}

/// Publishes the remote's reachability.
pub struct ConnectivityMonitor {
    tx: watch::Sender<bool>,
    cancel: CancellationToken,
}

impl ConnectivityMonitor {
    /// Starts probing `remote`. The channel starts at `false` until the
    /// first probe answers.
    pub fn spawn(
        remote: Arc<dyn RemoteDataService>,
        config: ConnectivityConfig,
    ) -> (Self, watch::Receiver<bool>, JoinHandle<()>) {
        let (tx, rx) = watch::channel(false);
        let cancel = CancellationToken::new();
        let task = tokio::spawn(probe_loop(remote, config, tx.clone(), cancel.clone()));
        (ConnectivityMonitor { tx, cancel }, rx, task)
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

async fn probe_loop(
    remote: Arc<dyn RemoteDataService>,
    config: ConnectivityConfig,
    tx: watch::Sender<bool>,
    cancel: CancellationToken,
) {
    let mut delay = config.initial_delay;

    loop {
        let probe = tokio::select! {
            _ = cancel.cancelled() => break,
            result = tokio::time::timeout(config.probe_timeout, remote.probe()) => result,
        };

        let online = match probe {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                debug!(error = %e, "probe failed");
                false
            }
            Err(_) => {
                debug!(timeout = ?config.probe_timeout, "probe timed out");
                false
            }
        };

        let changed = tx.send_if_modified(|current| {
            let changed = *current != online;
            *current = online;
            changed
        });
        if changed {
            if online {
                info!("remote reachable");
            } else {
                warn!("remote unreachable");
            }
        }

        let wait = if online {
            delay = config.initial_delay;
            config.probe_interval
        } else {
            let wait = delay;
            delay = next_delay(delay, config.max_delay);
            wait
        };

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(wait) => {}
        }
    }
    debug!("connectivity monitor stopped");
}

#[cfg(test)]
#[path = "connectivity_tests.rs"]
mod tests;
