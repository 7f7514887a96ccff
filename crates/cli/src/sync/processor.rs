// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Drains pending operations against the remote data service.
//!
//! Operations are sent one at a time in queue order. A failed operation is
//! marked failed and the drain moves on; only a storage failure stops it.

use std::sync::Arc;
use std::time::Duration;

use rp_core::{Action, FailureKind, Operation, ResourceType, Result};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::remote::{RemoteDataService, RemoteError};
use super::store::{OperationUpdate, SharedStore};

/// Result of one remote attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Completed {
        /// Remote record id, reported by inserts.
        #[serde(skip_serializing_if = "Option::is_none")]
        remote_id: Option<String>,
    },
    Failed {
        kind: FailureKind,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationResult {
    pub id: String,
    pub resource_type: ResourceType,
    #[serde(flatten)]
    pub outcome: Outcome,
}

/// Summary of a drain.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DrainReport {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Operations not attempted (completed, failed, or in flight elsewhere).
    pub skipped: usize,
    pub results: Vec<OperationResult>,
}

impl DrainReport {
    fn record(&mut self, op: &Operation, outcome: Outcome) {
        match outcome {
            Outcome::Completed { .. } => self.succeeded += 1,
            Outcome::Failed { .. } => self.failed += 1,
        }
        self.results.push(OperationResult {
            id: op.id.clone(),
            resource_type: op.resource_type.clone(),
            outcome,
        });
    }

    /// Result for one id, if it was attempted.
    pub fn result(&self, id: &str) -> Option<&OperationResult> {
        self.results.iter().find(|r| r.id == id)
    }
}

/// Sequential drain loop.
#[derive(Clone)]
pub struct Processor {
    store: SharedStore,
    remote: Arc<dyn RemoteDataService>,
    request_timeout: Duration,
}

impl Processor {
    pub fn new(
        store: SharedStore,
        remote: Arc<dyn RemoteDataService>,
        request_timeout: Duration,
    ) -> Self {
        Processor {
            store,
            remote,
            request_timeout,
        }
    }

    /// Sends every pending operation once, in queue order.
    ///
    /// Per-operation remote failures are recorded on the operation and in
    /// the report; the returned error is always a storage error.
    pub async fn process_queue(&self) -> Result<DrainReport> {
        let snapshot = self.store.read(|s| s.list());
        let mut report = DrainReport::default();

        for queued in snapshot {
            if !queued.is_pending() {
                report.skipped += 1;
                continue;
            }

            // The queue may have changed since the snapshot
            let claimed = self.store.mutate(|s| {
                if s.get(&queued.id).is_some_and(Operation::is_pending) {
                    s.update(&queued.id, OperationUpdate::syncing()).map(Some)
                } else {
                    Ok(None)
                }
            })?;
            let Some(op) = claimed else {
                report.skipped += 1;
                continue;
            };

            report.attempted += 1;
            debug!(id = %op.id, resource_type = %op.resource_type, "sending operation");

            let (update, outcome) = match self.dispatch(&op).await {
                Ok(remote_id) => (OperationUpdate::completed(), Outcome::Completed { remote_id }),
                Err(e) => {
                    let kind = e.kind();
                    let message = e.to_string();
                    (
                        OperationUpdate::failed(kind, message.clone()),
                        Outcome::Failed { kind, message },
                    )
                }
            };

            if let Err(e) = self.store.mutate(|s| s.update(&op.id, update)) {
                // Storage still says syncing, which reloads as pending
                error!(id = %op.id, error = %e, "could not record attempt result, operation will be resent");
                let _ = self.store.mutate(|s| {
                    s.release_attempt(&op.id);
                    Ok(())
                });
                return Err(e);
            }

            match &outcome {
                Outcome::Completed { .. } => debug!(id = %op.id, "operation acknowledged"),
                Outcome::Failed { kind, message } => {
                    warn!(id = %op.id, %kind, error = %message, "operation failed");
                }
            }
            report.record(&op, outcome);
        }

        if report.attempted > 0 {
            info!(
                attempted = report.attempted,
                succeeded = report.succeeded,
                failed = report.failed,
                "drain finished"
            );
        }
        Ok(report)
    }

    /// Invokes the remote capability for the operation's action.
    async fn dispatch(&self, op: &Operation) -> std::result::Result<Option<String>, RemoteError> {
        let resource = op.resource_type.resource().to_string();
        let id = op.id.clone();
        let call = async {
            match op.resource_type.action() {
                Action::Insert => self
                    .remote
                    .insert(resource, id, op.payload.clone())
                    .await
                    .map(Some),
                Action::Update => self
                    .remote
                    .update(resource, id, op.payload.clone())
                    .await
                    .map(|()| None),
                Action::Delete => self.remote.delete(resource, id).await.map(|()| None),
            }
        };

        match tokio::time::timeout(self.request_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(RemoteError::Timeout(self.request_timeout)),
        }
    }
}

#[cfg(test)]
#[path = "processor_tests.rs"]
mod tests;
