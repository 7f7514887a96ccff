// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Text rendering for queue contents and drain results.

use chrono::{DateTime, SecondsFormat, Utc};
use rp_core::Operation;

use crate::colors;
use crate::sync::{DrainReport, Outcome, QueueCounts, TriggerOutcome};

/// Formats an epoch-milliseconds timestamp as RFC 3339 (UTC).
///
/// Values chrono cannot represent fall back to the raw number.
pub fn format_timestamp(ms: u64) -> String {
    i64::try_from(ms)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_else(|| ms.to_string())
}

/// One queue line: `id  resource:action  status  created_at`, plus retry
/// count and last error when present.
pub fn format_operation(op: &Operation) -> String {
    let mut line = format!(
        "{}  {}  {}  {}",
        op.id,
        op.resource_type,
        colors::status(op.status),
        colors::context(&format_timestamp(op.created_at)),
    );
    if op.retry_count > 0 {
        line.push_str(&format!("  retries: {}", op.retry_count));
    }
    if op.deferred.is_some() {
        line.push_str("  (newer write queued)");
    }
    if let Some(err) = &op.last_error {
        match op.failure {
            Some(kind) => line.push_str(&format!("\n    {kind} error: {err}")),
            None => line.push_str(&format!("\n    error: {err}")),
        }
    }
    line
}

pub fn format_queue(ops: &[Operation]) -> String {
    if ops.is_empty() {
        return "queue is empty".to_string();
    }
    ops.iter()
        .map(format_operation)
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_counts(counts: &QueueCounts) -> String {
    let mut out = format!(
        "{} queued: {} pending, {} syncing, {} failed, {} completed",
        counts.queue_length, counts.pending, counts.syncing, counts.failed, counts.completed
    );
    if counts.permanent_failures > 0 {
        out.push_str(&format!(
            "\n{} rejected by the remote (retrying will not help)",
            counts.permanent_failures
        ));
    }
    out
}

pub fn format_drain(report: &DrainReport) -> String {
    if report.attempted == 0 {
        return "nothing to sync".to_string();
    }
    let mut lines = vec![format!(
        "synced {} of {} operation(s)",
        report.succeeded, report.attempted
    )];
    for result in &report.results {
        if let Outcome::Failed { kind, message } = &result.outcome {
            lines.push(format!(
                "  {} {}: {kind}: {message}",
                colors::status(rp_core::OperationStatus::Failed),
                result.id
            ));
        }
    }
    lines.join("\n")
}

pub fn format_trigger(outcome: &TriggerOutcome) -> String {
    match outcome {
        TriggerOutcome::Drained(report) => format_drain(report),
        TriggerOutcome::Coalesced => "a sync is already running".to_string(),
        TriggerOutcome::Suppressed => "offline, operations stay queued".to_string(),
    }
}

#[cfg(test)]
#[path = "display_tests.rs"]
mod tests;
