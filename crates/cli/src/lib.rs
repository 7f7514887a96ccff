// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! repsync - an offline-first mutation queue.
//!
//! Writes are recorded locally and replayed against a remote data service
//! once it is reachable. The library is what the `repsync` binary runs; it
//! can also be embedded.
//!
//! # Main Components
//!
//! - [`sync::SyncEngine`] - durable queue, processor, and retry controller
//! - [`sync::Scheduler`] - timer, connectivity, and manual drain triggers
//! - [`sync::ConnectivityMonitor`] - probes the remote and publishes reachability
//! - [`Config`] - user configuration (storage backend, remote, sync cadence)
//! - [`Error`] - Error types for all operations
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use repsync::sync::{SyncEngine, SyncSettings, WebSocketRemote};
//!
//! let config = repsync::Config::load(None)?;
//! let remote = Arc::new(WebSocketRemote::new(&config.remote.url, config.connect_timeout()));
//! let engine = SyncEngine::open(config.open_persistence()?, &config.user_id, remote, SyncSettings::default())?;
//! engine.enqueue("w1", "workouts:insert".parse()?, serde_json::json!({"name": "legs"}))?;
//! ```

mod cli;
pub mod colors;
mod commands;
mod display;
mod env;
pub mod help;

pub mod config;
pub mod error;
pub mod sync;

pub use cli::{Cli, Command, OutputFormat};
pub use config::Config;
pub use error::{Error, Result};

use clap::CommandFactory;
use clap_complete::generate;

use commands::Context;

/// Execute a parsed command line. This is the main entry point for library
/// users and provides a testable way to run commands without process
/// execution.
pub fn run(cli: Cli) -> Result<()> {
    if let Command::Completion { shell } = cli.command {
        generate(shell, &mut Cli::command(), "repsync", &mut std::io::stdout());
        return Ok(());
    }

    let config = Config::load(cli.config.as_deref())?;
    let ctx = Context::new(config, cli.offline);

    match cli.command {
        Command::Add {
            resource_type,
            id,
            payload,
            created_at,
            output,
        } => commands::add::run(&ctx, resource_type, id, &payload, created_at, output),
        Command::Queue { status, output } => commands::queue::run(&ctx, status, output),
        Command::Status { output } => commands::queue::status(&ctx, output),
        Command::Sync { output } => commands::sync::run(&ctx, output),
        Command::Retry { id, output } => commands::sync::retry(&ctx, id, output),
        Command::Discard { id, all_failed } => commands::discard::run(&ctx, id, all_failed),
        Command::Clear => commands::discard::clear(&ctx),
        Command::Watch => commands::watch::run(&ctx),
        Command::Completion { .. } => Ok(()),
    }
}

/// Default log filter when `REPSYNC_LOG` is unset.
pub fn default_log_filter(verbose: bool) -> &'static str {
    if verbose {
        "repsync=debug,rp_core=debug"
    } else {
        "warn"
    }
}

/// `REPSYNC_LOG`, if set.
pub fn log_filter_override() -> Option<String> {
    env::log_filter()
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
