// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! One-shot drains: `sync` and `retry`.

use serde::Serialize;

use crate::cli::OutputFormat;
use crate::display::format_trigger;
use crate::error::{Error, Result};
use crate::sync::{DrainReport, SyncEngine, TriggerOutcome};

use super::{block_on, print_json, Context};

#[derive(Serialize)]
struct DrainJson<'a> {
    outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    requeued: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<&'a DrainReport>,
}

fn outcome_str(outcome: &TriggerOutcome) -> &'static str {
    match outcome {
        TriggerOutcome::Drained(_) => "drained",
        TriggerOutcome::Coalesced => "coalesced",
        TriggerOutcome::Suppressed => "suppressed",
    }
}

fn report(
    outcome: &TriggerOutcome,
    requeued: Option<&[String]>,
    output: OutputFormat,
) -> Result<()> {
    match output {
        OutputFormat::Text => {
            if let Some(ids) = requeued {
                println!("requeued {} operation(s)", ids.len());
            }
            println!("{}", format_trigger(outcome));
        }
        OutputFormat::Json => print_json(&DrainJson {
            outcome: outcome_str(outcome),
            requeued,
            report: outcome.report(),
        })?,
    }
    check(outcome)
}

/// Fails when a drain left operations failed.
pub(crate) fn check(outcome: &TriggerOutcome) -> Result<()> {
    match outcome.report() {
        Some(r) if r.failed > 0 => Err(Error::DrainIncomplete {
            succeeded: r.succeeded,
            failed: r.failed,
        }),
        _ => Ok(()),
    }
}

pub fn run(ctx: &Context, output: OutputFormat) -> Result<()> {
    let engine = ctx.open_engine()?;
    block_on(run_impl(&engine, output))?
}

pub(crate) async fn run_impl(engine: &SyncEngine, output: OutputFormat) -> Result<()> {
    let outcome = engine.process_queue().await?;
    report(&outcome, None, output)
}

pub fn retry(ctx: &Context, id: Option<String>, output: OutputFormat) -> Result<()> {
    let engine = ctx.open_engine()?;
    block_on(retry_impl(&engine, id.as_deref(), output))?
}

pub(crate) async fn retry_impl(
    engine: &SyncEngine,
    id: Option<&str>,
    output: OutputFormat,
) -> Result<()> {
    let outcome = match id {
        Some(id) => engine.retry_operation(id).await?,
        None => engine.retry_failed().await?,
    };
    report(&outcome.drain, Some(&outcome.requeued), output)
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
