// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod add;
pub mod discard;
pub mod queue;
pub mod sync;
pub mod watch;

#[cfg(test)]
#[path = "mod_tests.rs"]
pub mod testing;

use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::sync::{RemoteDataService, SyncEngine, WebSocketRemote};

/// Where a command runs: loaded config plus global flags.
pub struct Context {
    pub config: Config,
    pub offline: bool,
}

impl Context {
    pub fn new(config: Config, offline: bool) -> Self {
        Context { config, offline }
    }

    /// WebSocket client for the configured remote. Connects lazily.
    pub fn remote(&self) -> Arc<dyn RemoteDataService> {
        Arc::new(WebSocketRemote::new(
            self.config.remote.url.clone(),
            self.config.connect_timeout(),
        ))
    }

    /// Opens the configured queue with a WebSocket remote.
    pub fn open_engine(&self) -> Result<SyncEngine> {
        self.open_engine_with(self.remote())
    }

    pub(crate) fn open_engine_with(&self, remote: Arc<dyn RemoteDataService>) -> Result<SyncEngine> {
        let persistence = self.config.open_persistence()?;
        let engine = SyncEngine::open(
            persistence,
            &self.config.user_id,
            remote,
            self.config.sync_settings(),
        )?;
        if self.offline {
            debug!("offline mode, drains suppressed");
            engine.set_online(false);
        }
        Ok(engine)
    }
}

/// Drives `fut` to completion on a fresh multi-threaded runtime.
pub fn block_on<F: Future>(fut: F) -> Result<F::Output> {
    let rt = tokio::runtime::Runtime::new().map_err(|e| Error::Runtime(e.to_string()))?;
    Ok(rt.block_on(fut))
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
