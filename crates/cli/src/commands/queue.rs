// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Read-only views: `queue` and `status`.

use rp_core::{Operation, OperationStatus};
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::display::{format_counts, format_queue};
use crate::error::Result;
use crate::sync::{QueueCounts, SyncEngine};

use super::{print_json, Context};

#[derive(Serialize)]
struct QueueJson {
    operations: Vec<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status_filter: Option<OperationStatus>,
}

#[derive(Serialize)]
struct StatusJson {
    #[serde(flatten)]
    counts: QueueCounts,
    online: bool,
    syncing: bool,
}

pub fn run(ctx: &Context, status: Option<OperationStatus>, output: OutputFormat) -> Result<()> {
    let engine = ctx.open_engine()?;
    run_impl(&engine, status, output)
}

/// Operations in queue order, optionally restricted to one status.
pub(crate) fn select(engine: &SyncEngine, status: Option<OperationStatus>) -> Vec<Operation> {
    engine
        .get_queue()
        .into_iter()
        .filter(|op| status.map_or(true, |s| op.status == s))
        .collect()
}

pub(crate) fn run_impl(
    engine: &SyncEngine,
    status: Option<OperationStatus>,
    output: OutputFormat,
) -> Result<()> {
    let operations = select(engine, status);
    match output {
        OutputFormat::Text => println!("{}", format_queue(&operations)),
        OutputFormat::Json => print_json(&QueueJson {
            operations,
            status_filter: status,
        })?,
    }
    Ok(())
}

pub fn status(ctx: &Context, output: OutputFormat) -> Result<()> {
    let engine = ctx.open_engine()?;
    status_impl(&engine, output)
}

pub(crate) fn status_impl(engine: &SyncEngine, output: OutputFormat) -> Result<()> {
    let counts = engine.counts();
    match output {
        OutputFormat::Text => println!("{}", format_counts(&counts)),
        OutputFormat::Json => print_json(&StatusJson {
            counts,
            online: engine.is_online(),
            syncing: engine.is_syncing(),
        })?,
    }
    Ok(())
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
