// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Queue housekeeping: `discard` and `clear`.

use crate::error::{Error, Result};
use crate::sync::SyncEngine;

use super::Context;

pub fn run(ctx: &Context, id: Option<String>, all_failed: bool) -> Result<()> {
    let engine = ctx.open_engine()?;
    run_impl(&engine, id.as_deref(), all_failed)
}

pub(crate) fn run_impl(engine: &SyncEngine, id: Option<&str>, all_failed: bool) -> Result<()> {
    match (id, all_failed) {
        (Some(id), _) => {
            let op = engine.discard_operation(id)?;
            println!("discarded {} ({})", op.id, op.resource_type);
        }
        (None, true) => {
            let n = engine.discard_all_failed()?;
            println!("discarded {n} failed operation(s)");
        }
        (None, false) => return Err(Error::NothingToDiscard),
    }
    Ok(())
}

pub fn clear(ctx: &Context) -> Result<()> {
    let engine = ctx.open_engine()?;
    clear_impl(&engine)
}

pub(crate) fn clear_impl(engine: &SyncEngine) -> Result<()> {
    let n = engine.clear_completed()?;
    println!("removed {n} completed operation(s)");
    Ok(())
}

#[cfg(test)]
#[path = "discard_tests.rs"]
mod tests;
