// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The caller-facing sync engine.
//!
//! One [`SyncEngine`] exists per user session. It is built from injected
//! ports (persistence and remote) and shares no state with other engines.

use std::sync::Arc;
use std::time::Duration;

use rp_core::{MonotonicClock, Operation, PersistencePort, ResourceType, Result};
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, info};

use super::processor::Processor;
use super::remote::RemoteDataService;
use super::retry::{RetryController, DEFAULT_MAX_RETRIES};
use super::scheduler::{Admission, DrainGate, Trigger, TriggerOutcome};
use super::status::QueueCounts;
use super::store::{queue_key, AppendOutcome, QueueStore, SharedStore};

/// Tunables for a [`SyncEngine`].
#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub max_retries: u32,
    /// Upper bound on a single remote call.
    pub request_timeout: Duration,
}

impl Default for SyncSettings {
    fn default() -> Self {
        SyncSettings {
            max_retries: DEFAULT_MAX_RETRIES,
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Result of a retry request.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryOutcome {
    /// Ids moved back to pending.
    pub requeued: Vec<String>,
    pub drain: TriggerOutcome,
}

/// Offline mutation queue plus the machinery that reconciles it.
#[derive(Clone)]
pub struct SyncEngine {
    store: SharedStore,
    processor: Processor,
    retry: RetryController,
    gate: Arc<DrainGate>,
    clock: Arc<MonotonicClock>,
}

impl SyncEngine {
    /// Loads `user_id`'s queue and wires up the engine.
    ///
    /// The engine starts out online; connectivity updates come from the
    /// scheduler or [`set_online`](Self::set_online).
    pub fn open(
        persistence: Box<dyn PersistencePort>,
        user_id: &str,
        remote: Arc<dyn RemoteDataService>,
        settings: SyncSettings,
    ) -> Result<Self> {
        let store = QueueStore::open(persistence, queue_key(user_id))?;

        let clock = MonotonicClock::new();
        if let Some(latest) = store.max_created_at() {
            clock.observe(latest);
        }

        let queued = store.len();
        let store = SharedStore::new(store);
        info!(user_id, queued, "sync engine ready");

        Ok(SyncEngine {
            processor: Processor::new(store.clone(), remote, settings.request_timeout),
            retry: RetryController::new(store.clone(), settings.max_retries),
            store,
            gate: DrainGate::new(true),
            clock: Arc::new(clock),
        })
    }

    /// Durably queues a mutation before returning.
    pub fn add_operation(&self, op: Operation) -> Result<AppendOutcome> {
        self.clock.observe(op.created_at);
        let id = op.id.clone();
        let outcome = self.store.mutate(|s| s.append(op))?;
        debug!(%id, ?outcome, "operation queued");
        Ok(outcome)
    }

    /// Queues a mutation stamped with the engine's monotonic clock.
    pub fn enqueue(
        &self,
        id: impl Into<String>,
        resource_type: ResourceType,
        payload: Value,
    ) -> Result<AppendOutcome> {
        self.add_operation(Operation::new(id, resource_type, payload, self.clock.now()))
    }

    /// Ordered snapshot of the queue.
    pub fn get_queue(&self) -> Vec<Operation> {
        self.store.read(|s| s.list())
    }

    pub fn get_operation(&self, id: &str) -> Option<Operation> {
        self.store.read(|s| s.get(id).cloned())
    }

    /// Explicit "sync now".
    pub async fn process_queue(&self) -> Result<TriggerOutcome> {
        self.trigger(Trigger::SyncNow).await
    }

    /// Runs a drain if the gate allows it.
    pub async fn trigger(&self, trigger: Trigger) -> Result<TriggerOutcome> {
        match self.gate.admit() {
            Admission::Suppressed => Ok(TriggerOutcome::Suppressed),
            Admission::Coalesced => Ok(TriggerOutcome::Coalesced),
            Admission::Granted(_permit) => {
                debug!(%trigger, "drain starting");
                let report = self.processor.process_queue().await?;
                Ok(TriggerOutcome::Drained(report))
            }
        }
    }

    /// Requeues every failed operation under the retry limit, then drains.
    pub async fn retry_failed(&self) -> Result<RetryOutcome> {
        let requeued = self.retry.retry_failed()?;
        let drain = self.trigger(Trigger::Retry).await?;
        Ok(RetryOutcome { requeued, drain })
    }

    /// Requeues one failed operation, then drains.
    pub async fn retry_operation(&self, id: &str) -> Result<RetryOutcome> {
        let op = self.retry.retry_operation(id)?;
        let drain = self.trigger(Trigger::Retry).await?;
        Ok(RetryOutcome {
            requeued: vec![op.id],
            drain,
        })
    }

    /// Requeues transient failures without draining.
    pub(crate) fn requeue_transient(&self) -> Result<Vec<String>> {
        self.retry.retry_transient()
    }

    pub fn discard_operation(&self, id: &str) -> Result<Operation> {
        self.retry.discard_operation(id)
    }

    pub fn discard_all_failed(&self) -> Result<usize> {
        self.retry.discard_all_failed()
    }

    pub fn clear_completed(&self) -> Result<usize> {
        self.retry.clear_completed()
    }

    pub fn counts(&self) -> QueueCounts {
        self.store.status().current()
    }

    /// Receives fresh counts after every queue mutation.
    pub fn subscribe(&self) -> watch::Receiver<QueueCounts> {
        self.store.status().subscribe()
    }

    /// Records connectivity. Returns the previous value.
    pub fn set_online(&self, online: bool) -> bool {
        self.gate.set_online(online)
    }

    pub fn is_online(&self) -> bool {
        self.gate.is_online()
    }

    pub fn is_syncing(&self) -> bool {
        self.gate.is_syncing()
    }

    pub fn max_retries(&self) -> u32 {
        self.retry.max_retries()
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
