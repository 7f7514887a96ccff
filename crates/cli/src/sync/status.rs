// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Derived queue counts, pushed to subscribers.
//!
//! Counts are never stored. They are recomputed from the queue after each
//! mutation and published on a [`tokio::sync::watch`] channel; subscribers
//! only wake when a count actually changes.

use std::sync::Arc;

use rp_core::{Operation, OperationStatus};
use serde::Serialize;
use tokio::sync::watch;

/// Snapshot of the queue by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueueCounts {
    pub pending: usize,
    pub syncing: usize,
    pub failed: usize,
    pub completed: usize,
    pub queue_length: usize,
    /// Failed operations whose last failure was permanent.
    pub permanent_failures: usize,
}

impl QueueCounts {
    pub fn from_ops<'a>(ops: impl IntoIterator<Item = &'a Operation>) -> Self {
        let mut counts = QueueCounts::default();
        for op in ops {
            counts.queue_length += 1;
            match op.status {
                OperationStatus::Pending => counts.pending += 1,
                OperationStatus::Syncing => counts.syncing += 1,
                OperationStatus::Completed => counts.completed += 1,
                OperationStatus::Failed => {
                    counts.failed += 1;
                    if op.is_permanent_failure() {
                        counts.permanent_failures += 1;
                    }
                }
            }
        }
        counts
    }
}

/// Publishes [`QueueCounts`] to any number of subscribers.
#[derive(Clone)]
pub struct StatusAggregator {
    tx: Arc<watch::Sender<QueueCounts>>,
}

impl StatusAggregator {
    pub fn new(initial: QueueCounts) -> Self {
        let (tx, _) = watch::channel(initial);
        StatusAggregator { tx: Arc::new(tx) }
    }

    /// Publishes new counts. Returns true if they differ from the last ones.
    pub fn publish(&self, counts: QueueCounts) -> bool {
        self.tx.send_if_modified(|current| {
            if *current == counts {
                false
            } else {
                *current = counts;
                true
            }
        })
    }

    pub fn current(&self) -> QueueCounts {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<QueueCounts> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
