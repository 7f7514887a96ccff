// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use rp_core::{Operation, ResourceType};
use serde::Serialize;
use serde_json::Value;

use crate::cli::OutputFormat;
use crate::error::{Error, Result};
use crate::sync::{AppendOutcome, SyncEngine};

use super::{print_json, Context};

#[derive(Serialize)]
struct AddJson<'a> {
    id: &'a str,
    resource_type: &'a ResourceType,
    outcome: &'static str,
}

fn outcome_str(outcome: AppendOutcome) -> &'static str {
    match outcome {
        AppendOutcome::Queued => "queued",
        AppendOutcome::Replaced => "replaced",
        AppendOutcome::Deferred => "deferred",
    }
}

pub fn run(
    ctx: &Context,
    resource_type: ResourceType,
    id: String,
    payload: &str,
    created_at: Option<u64>,
    output: OutputFormat,
) -> Result<()> {
    let engine = ctx.open_engine()?;
    run_impl(&engine, resource_type, id, payload, created_at, output)
}

pub(crate) fn run_impl(
    engine: &SyncEngine,
    resource_type: ResourceType,
    id: String,
    payload: &str,
    created_at: Option<u64>,
    output: OutputFormat,
) -> Result<()> {
    if id.trim().is_empty() {
        return Err(Error::EmptyId);
    }
    let payload = parse_payload(payload)?;

    let outcome = match created_at {
        Some(ts) => engine.add_operation(Operation::new(
            id.clone(),
            resource_type.clone(),
            payload,
            ts,
        ))?,
        None => engine.enqueue(id.clone(), resource_type.clone(), payload)?,
    };

    match output {
        OutputFormat::Text => match outcome {
            AppendOutcome::Queued => println!("queued {id} ({resource_type})"),
            AppendOutcome::Replaced => println!("replaced queued write for {id}"),
            AppendOutcome::Deferred => {
                println!("{id} is syncing; this write will follow once it resolves")
            }
        },
        OutputFormat::Json => print_json(&AddJson {
            id: &id,
            resource_type: &resource_type,
            outcome: outcome_str(outcome),
        })?,
    }
    Ok(())
}

/// Parses `--payload`. Anything that is valid JSON is accepted.
pub(crate) fn parse_payload(raw: &str) -> Result<Value> {
    serde_json::from_str(raw).map_err(|e| Error::InvalidPayload(e.to_string()))
}

#[cfg(test)]
#[path = "add_tests.rs"]
mod tests;
