// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use crate::colors;
use crate::help;
use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use rp_core::{OperationStatus, ResourceType};

/// Parse a string that must not be empty or whitespace-only.
fn non_empty_string(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        Err("cannot be empty".to_string())
    } else {
        Ok(s.to_string())
    }
}

fn parse_resource_type(s: &str) -> Result<ResourceType, String> {
    s.parse().map_err(|e: rp_core::Error| e.to_string())
}

fn parse_status(s: &str) -> Result<OperationStatus, String> {
    s.parse().map_err(|e: rp_core::Error| e.to_string())
}

/// Output format for commands supporting structured output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "repsync")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Offline-first mutation queue that reconciles with a remote data service")]
#[command(
    long_about = "Offline-first mutation queue that reconciles with a remote data service.\n\n\
    Writes are queued durably on this machine and replayed against the remote \
    when it is reachable. Repeated writes to the same id collapse into one."
)]
#[command(help_template = help::template())]
#[command(before_help = help::commands())]
#[command(after_help = help::quickstart())]
#[command(styles = help::styles())]
pub struct Cli {
    /// Config file (default: $REPSYNC_CONFIG or <config dir>/repsync/config.toml)
    #[arg(long, global = true, value_name = "path")]
    pub config: Option<PathBuf>,

    /// Verbose logging (overridden by REPSYNC_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Treat the remote as unreachable; drains are suppressed
    #[arg(long, global = true)]
    pub offline: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Queue a mutation
    #[command(after_help = colors::examples("\
Examples:
  repsync add workouts:insert w1 --payload '{\"name\":\"legs\"}'    Queue an insert
  repsync add workouts:update w1 --payload '{\"name\":\"push\"}'    Replace the queued write for w1
  repsync add sets:delete s9                                      Queue a delete"))]
    Add {
        /// Resource and action, e.g. workouts:insert
        #[arg(value_parser = parse_resource_type, value_name = "resource:action")]
        resource_type: ResourceType,

        /// Operation id; later writes with the same id replace this one
        #[arg(value_parser = non_empty_string)]
        id: String,

        /// JSON payload sent to the remote
        #[arg(long, short, default_value = "{}")]
        payload: String,

        /// Creation time in epoch milliseconds (default: now)
        #[arg(long, value_name = "ms")]
        created_at: Option<u64>,

        /// Output format (text, json)
        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// List queued operations in order
    #[command(after_help = colors::examples("\
Examples:
  repsync queue                 Show every queued operation
  repsync queue -s failed       Show failed operations only
  repsync queue -o json         Machine-readable output"))]
    Queue {
        /// Only show operations with this status
        #[arg(long, short, value_parser = parse_status)]
        status: Option<OperationStatus>,

        /// Output format (text, json)
        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Show queue counts
    Status {
        /// Output format (text, json)
        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Drain the queue against the remote once
    Sync {
        /// Output format (text, json)
        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Requeue failed operations and drain
    #[command(after_help = colors::examples("\
Examples:
  repsync retry                 Retry every failed operation under the retry limit
  repsync retry w1              Retry one operation, even after a rejection"))]
    Retry {
        /// Retry only this operation
        id: Option<String>,

        /// Output format (text, json)
        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Remove failed operations from the queue
    Discard {
        /// Operation to discard
        #[arg(conflicts_with = "all_failed")]
        id: Option<String>,

        /// Discard every failed operation
        #[arg(long)]
        all_failed: bool,
    },

    /// Remove completed operations from the queue
    Clear,

    /// Keep syncing in the foreground until interrupted
    Watch,

    /// Generate shell completions
    #[command(arg_required_else_help = true)]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
