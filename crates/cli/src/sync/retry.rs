// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Moves failed operations back into the queue, or out of it.
//!
//! Each retry counts against `max_retries`; once an operation has used its
//! budget it stays failed until it is discarded or rewritten by a new
//! `add_operation` for the same id.

use rp_core::{Error, Operation, OperationStatus, Result};
use tracing::{debug, info};

use super::store::{OperationUpdate, SharedStore};

/// Default retry budget per operation.
pub const DEFAULT_MAX_RETRIES: u32 = 5;

#[derive(Clone)]
pub struct RetryController {
    store: SharedStore,
    max_retries: u32,
}

impl RetryController {
    pub fn new(store: SharedStore, max_retries: u32) -> Self {
        RetryController { store, max_retries }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Resets every failed operation that still has retries left.
    ///
    /// Returns the ids moved back to pending.
    pub fn retry_failed(&self) -> Result<Vec<String>> {
        self.retry_where(|_| true)
    }

    /// Like [`retry_failed`](Self::retry_failed), but only for transient failures.
    pub fn retry_transient(&self) -> Result<Vec<String>> {
        self.retry_where(|op| op.failure.map_or(true, |kind| kind.is_retryable()))
    }

    fn retry_where(&self, eligible: impl Fn(&Operation) -> bool) -> Result<Vec<String>> {
        let max_retries = self.max_retries;
        let ids = self.store.mutate(|s| {
            let candidates: Vec<(String, OperationUpdate)> = s
                .iter()
                .filter(|op| op.is_failed() && op.retry_count < max_retries && eligible(op))
                .map(|op| (op.id.clone(), OperationUpdate::retry()))
                .collect();
            if candidates.is_empty() {
                return Ok(Vec::new());
            }
            let updated = s.update_many(candidates)?;
            Ok(updated.into_iter().map(|op| op.id).collect::<Vec<_>>())
        })?;

        if !ids.is_empty() {
            info!(count = ids.len(), "failed operations queued for retry");
        }
        Ok(ids)
    }

    /// Resets one failed operation, even if its failure was permanent.
    pub fn retry_operation(&self, id: &str) -> Result<Operation> {
        let max_retries = self.max_retries;
        let op = self.store.mutate(|s| {
            let op = s
                .get(id)
                .ok_or_else(|| Error::OperationNotFound(id.to_string()))?;
            if !op.is_failed() {
                return Err(Error::InvalidTransition {
                    id: id.to_string(),
                    from: op.status.to_string(),
                    to: OperationStatus::Pending.to_string(),
                });
            }
            if op.retry_count >= max_retries {
                return Err(Error::RetryLimitReached {
                    id: id.to_string(),
                    max_retries,
                });
            }
            s.update(id, OperationUpdate::retry())
        })?;
        debug!(id, retry_count = op.retry_count, "operation queued for retry");
        Ok(op)
    }

    /// Permanently removes one failed operation.
    pub fn discard_operation(&self, id: &str) -> Result<Operation> {
        let mut removed = self.store.mutate(|s| {
            let op = s
                .get(id)
                .ok_or_else(|| Error::OperationNotFound(id.to_string()))?;
            if !op.is_failed() {
                return Err(Error::InvalidTransition {
                    id: id.to_string(),
                    from: op.status.to_string(),
                    to: "discarded".to_string(),
                });
            }
            s.remove_where(|op| op.id == id)
        })?;
        let op = removed
            .pop()
            .ok_or_else(|| Error::OperationNotFound(id.to_string()))?;
        info!(id, "failed operation discarded");
        Ok(op)
    }

    /// Permanently removes every failed operation. Returns how many.
    pub fn discard_all_failed(&self) -> Result<usize> {
        let removed = self.store.mutate(|s| s.remove_where(Operation::is_failed))?;
        if !removed.is_empty() {
            info!(count = removed.len(), "failed operations discarded");
        }
        Ok(removed.len())
    }

    /// Removes every completed operation. Returns how many.
    pub fn clear_completed(&self) -> Result<usize> {
        let removed = self
            .store
            .mutate(|s| s.remove_where(|op| op.status == OperationStatus::Completed))?;
        debug!(count = removed.len(), "completed operations cleared");
        Ok(removed.len())
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
