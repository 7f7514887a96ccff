// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! `watch`: run the scheduler in the foreground until interrupted.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

use crate::config::Config;
use crate::display::format_counts;
use crate::error::Result;
use crate::sync::{ConnectivityMonitor, RemoteDataService, Scheduler, SyncEngine};

use super::{block_on, Context};

pub fn run(ctx: &Context) -> Result<()> {
    let remote = ctx.remote();
    let engine = ctx.open_engine_with(remote.clone())?;
    let config = ctx.config.clone();
    let offline = ctx.offline;
    block_on(async move {
        let shutdown = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "cannot listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        };
        run_impl(engine, remote, &config, offline, shutdown).await
    })?
}

/// Runs until `shutdown` resolves, printing counts whenever they change.
///
/// With `offline` set no probes are sent and the queue only accumulates.
pub(crate) async fn run_impl(
    engine: SyncEngine,
    remote: Arc<dyn RemoteDataService>,
    config: &Config,
    offline: bool,
    shutdown: impl Future<Output = ()>,
) -> Result<()> {
    let mut monitor = None;
    let connectivity = if offline {
        // Sender dropped at once: the scheduler keeps the last value
        watch::channel(false).1
    } else {
        let (m, rx, task) = ConnectivityMonitor::spawn(remote, config.connectivity_config());
        monitor = Some((m, task));
        rx
    };

    let mut counts = engine.subscribe();
    let (handle, scheduler) = Scheduler::spawn(engine, config.scheduler_config(), connectivity);
    info!(url = %config.remote.url, "watching");
    let initial = *counts.borrow_and_update();
    println!("{}", format_counts(&initial));

    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            changed = counts.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = *counts.borrow_and_update();
                println!("{}", format_counts(&snapshot));
            }
        }
    }

    handle.shutdown();
    if let Err(e) = scheduler.await {
        warn!(error = %e, "scheduler task failed");
    }
    if let Some((monitor, task)) = monitor {
        monitor.cancel();
        if let Err(e) = task.await {
            warn!(error = %e, "connectivity task failed");
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "watch_tests.rs"]
mod tests;
