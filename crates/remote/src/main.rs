// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! rp-remote: reference remote data service for repsync.
//!
//! Stores records in SQLite and answers insert, update and delete requests
//! over WebSocket. Inserts are idempotent on their key.

mod db;
mod server;
mod state;

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// rp-remote: reference remote data service
#[derive(Parser, Debug)]
#[command(name = "rp-remote")]
#[command(about = "WebSocket remote data service for repsync")]
struct Args {
    /// Address to bind the server to
    #[arg(short, long, default_value = "0.0.0.0:7890")]
    bind: SocketAddr,

    /// Directory for the record database
    #[arg(short, long, default_value = ".")]
    data: PathBuf,

    /// Accepted resources, comma separated (default: any)
    #[arg(short, long, value_delimiter = ',')]
    resources: Vec<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();

    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting rp-remote server");
    info!("  Bind address: {}", args.bind);
    info!("  Data directory: {}", args.data.display());
    if !args.resources.is_empty() {
        info!("  Resources: {}", args.resources.join(", "));
    }

    std::fs::create_dir_all(&args.data)?;
    let state = state::ServerState::open(&args.data, args.resources)?;

    server::run(args.bind, state).await?;

    Ok(())
}
