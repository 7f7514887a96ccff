// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Durable, ordered queue of operations.
//!
//! The queue is persisted as a single JSON array under one key
//! (`sync_queue:<user>`). Every mutation rewrites and persists the whole
//! array before returning; if the write fails, the in-memory queue is
//! rolled back so memory never runs ahead of storage.
//!
//! Deduplication happens here: there is at most one operation per id, kept
//! at the position where the id first appeared.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rp_core::{
    Action, DeferredWrite, Error, FailureKind, Operation, OperationStatus, PersistencePort,
    ResourceType, Result,
};
use serde_json::Value;
use tracing::{debug, error, warn};

use super::status::{QueueCounts, StatusAggregator};

/// Returns the persistence key for a user's queue.
pub fn queue_key(user_id: &str) -> String {
    format!("sync_queue:{user_id}")
}

/// What [`QueueStore::append`] did with an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// New id, appended at the end.
    Queued,
    /// Existing id, replaced in place.
    Replaced,
    /// Existing id is in flight; the write is applied once the attempt resolves.
    Deferred,
}

/// A status transition plus the fields that go with it.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationUpdate {
    pub status: OperationStatus,
    pub last_error: Option<String>,
    pub failure: Option<FailureKind>,
    pub bump_retry: bool,
}

impl OperationUpdate {
    pub fn syncing() -> Self {
        Self::to(OperationStatus::Syncing)
    }

    pub fn completed() -> Self {
        Self::to(OperationStatus::Completed)
    }

    pub fn failed(kind: FailureKind, message: impl Into<String>) -> Self {
        OperationUpdate {
            last_error: Some(message.into()),
            failure: Some(kind),
            ..Self::to(OperationStatus::Failed)
        }
    }

    /// Back to pending, counting one more retry.
    pub fn retry() -> Self {
        OperationUpdate {
            bump_retry: true,
            ..Self::to(OperationStatus::Pending)
        }
    }

    fn to(status: OperationStatus) -> Self {
        OperationUpdate {
            status,
            last_error: None,
            failure: None,
            bump_retry: false,
        }
    }
}

/// The persisted operation queue for one user.
pub struct QueueStore {
    persistence: Box<dyn PersistencePort>,
    key: String,
    ops: Vec<Operation>,
    index: HashMap<String, usize>,
}

impl QueueStore {
    /// Loads the queue stored at `key`.
    ///
    /// Unreadable data never fails the open: a corrupt array yields an
    /// empty queue (the raw bytes are copied to `<key>:corrupt`), and
    /// unreadable entries are dropped. Only a failing read is an error.
    pub fn open(persistence: Box<dyn PersistencePort>, key: impl Into<String>) -> Result<Self> {
        let mut store = QueueStore {
            persistence,
            key: key.into(),
            ops: Vec::new(),
            index: HashMap::new(),
        };
        if let Some(bytes) = store.persistence.get(&store.key)? {
            store.load(&bytes);
        }
        debug!(key = %store.key, len = store.ops.len(), "queue loaded");
        Ok(store)
    }

    fn load(&mut self, bytes: &[u8]) {
        let entries: Vec<Value> = match serde_json::from_slice(bytes) {
            Ok(entries) => entries,
            Err(e) => {
                error!(key = %self.key, error = %e, "queue data is corrupt, starting with an empty queue");
                self.quarantine(bytes);
                return;
            }
        };

        for (position, entry) in entries.into_iter().enumerate() {
            let mut op: Operation = match serde_json::from_value(entry) {
                Ok(op) => op,
                Err(e) => {
                    error!(key = %self.key, position, error = %e, "dropping unreadable queued operation");
                    continue;
                }
            };
            if let Err(e) = op.validate() {
                error!(key = %self.key, position, error = %e, "dropping invalid queued operation");
                continue;
            }
            if op.status == OperationStatus::Syncing {
                // Interrupted mid-drain; the remote may or may not have applied it
                warn!(id = %op.id, "operation was in flight at last shutdown, resending");
                op.status = OperationStatus::Pending;
            }
            if op.deferred.is_some() {
                debug!(id = %op.id, "applying write deferred before last shutdown");
                let acknowledged = op.status == OperationStatus::Completed;
                fold_deferred(&mut op, acknowledged);
            }

            match self.index.get(&op.id).copied() {
                Some(existing) => {
                    warn!(id = %op.id, "duplicate id in stored queue, keeping the later entry");
                    if let Some(slot) = self.ops.get_mut(existing) {
                        *slot = op;
                    }
                }
                None => {
                    self.index.insert(op.id.clone(), self.ops.len());
                    self.ops.push(op);
                }
            }
        }
    }

    /// Keeps unreadable bytes around for inspection.
    fn quarantine(&mut self, bytes: &[u8]) {
        let corrupt_key = format!("{}:corrupt", self.key);
        if let Err(e) = self.persistence.set(&corrupt_key, bytes) {
            error!(key = %corrupt_key, error = %e, "failed to preserve corrupt queue data");
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Ordered snapshot of the queue.
    pub fn list(&self) -> Vec<Operation> {
        self.ops.clone()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Operation> {
        self.ops.iter()
    }

    pub fn get(&self, id: &str) -> Option<&Operation> {
        self.index.get(id).and_then(|&i| self.ops.get(i))
    }

    pub fn counts(&self) -> QueueCounts {
        QueueCounts::from_ops(&self.ops)
    }

    /// Latest `created_at` in the queue, if any.
    pub fn max_created_at(&self) -> Option<u64> {
        self.ops.iter().map(|op| op.created_at).max()
    }

    /// Adds an operation, collapsing it onto an existing one with the same id.
    pub fn append(&mut self, mut op: Operation) -> Result<AppendOutcome> {
        op.validate()?;

        match self.index.get(&op.id).copied() {
            None => {
                op.status = OperationStatus::Pending;
                op.retry_count = 0;
                op.last_error = None;
                op.failure = None;
                op.deferred = None;
                self.transact(|ops| {
                    ops.push(op);
                    Ok(AppendOutcome::Queued)
                })
            }
            Some(position) => self.transact(|ops| {
                let existing = ops
                    .get_mut(position)
                    .ok_or_else(|| Error::OperationNotFound(op.id.clone()))?;
                Ok(merge_duplicate(existing, op))
            }),
        }
    }

    /// Applies a status transition to one operation.
    pub fn update(&mut self, id: &str, update: OperationUpdate) -> Result<Operation> {
        let mut updated = self.update_many(vec![(id.to_string(), update)])?;
        updated
            .pop()
            .ok_or_else(|| Error::OperationNotFound(id.to_string()))
    }

    /// Applies several transitions in one write. All or nothing.
    pub fn update_many(&mut self, updates: Vec<(String, OperationUpdate)>) -> Result<Vec<Operation>> {
        let mut positioned = Vec::with_capacity(updates.len());
        for (id, update) in updates {
            let position = self.position(&id)?;
            positioned.push((position, update));
        }

        self.transact(|ops| {
            let mut updated = Vec::with_capacity(positioned.len());
            for (position, update) in positioned {
                let op = ops
                    .get_mut(position)
                    .ok_or_else(|| Error::OperationNotFound(position.to_string()))?;
                apply_update(op, update)?;
                updated.push(op.clone());
            }
            Ok(updated)
        })
    }

    /// Hands an in-flight operation back to the queue without persisting.
    ///
    /// For when the write recording an attempt's result fails. Storage keeps
    /// the operation as `syncing`, which reloads as pending, so memory and
    /// storage both resend it.
    pub fn release_attempt(&mut self, id: &str) {
        let Some(op) = self.index.get(id).copied().and_then(|i| self.ops.get_mut(i)) else {
            return;
        };
        if op.status == OperationStatus::Syncing {
            op.status = OperationStatus::Pending;
            fold_deferred(op, false);
        }
    }

    /// Removes the given ids. Unknown ids are ignored.
    pub fn remove(&mut self, ids: &[String]) -> Result<usize> {
        let ids: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let removed = self.remove_where(|op| ids.contains(op.id.as_str()))?;
        Ok(removed.len())
    }

    /// Removes every operation matching `predicate`, returning them.
    pub fn remove_where(&mut self, predicate: impl Fn(&Operation) -> bool) -> Result<Vec<Operation>> {
        if !self.ops.iter().any(&predicate) {
            return Ok(Vec::new());
        }
        self.transact(|ops| {
            let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(ops)
                .into_iter()
                .partition(|op| predicate(op));
            *ops = kept;
            Ok(removed)
        })
    }

    fn position(&self, id: &str) -> Result<usize> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| Error::OperationNotFound(id.to_string()))
    }

    /// Runs a mutation and persists it, restoring the previous queue on failure.
    fn transact<R>(&mut self, mutation: impl FnOnce(&mut Vec<Operation>) -> Result<R>) -> Result<R> {
        let previous = self.ops.clone();
        let result = mutation(&mut self.ops).and_then(|value| {
            self.persist()?;
            Ok(value)
        });
        if result.is_err() {
            self.ops = previous;
        }
        self.reindex();
        result
    }

    fn persist(&mut self) -> Result<()> {
        let bytes = serde_json::to_vec(&self.ops)?;
        self.persistence.set(&self.key, &bytes).map_err(|e| {
            error!(key = %self.key, error = %e, "failed to persist queue");
            e
        })
    }

    fn reindex(&mut self) {
        self.index.clear();
        for (i, op) in self.ops.iter().enumerate() {
            self.index.insert(op.id.clone(), i);
        }
    }
}

/// Last writer (by arrival) wins; position and retry count are kept.
fn merge_duplicate(existing: &mut Operation, incoming: Operation) -> AppendOutcome {
    if incoming.created_at < existing.created_at {
        warn!(
            id = %existing.id,
            stored = existing.created_at,
            incoming = incoming.created_at,
            "duplicate write is older than the queued one, applying it anyway"
        );
    }

    if existing.status == OperationStatus::Syncing {
        debug!(id = %existing.id, "operation in flight, deferring write");
        existing.deferred = Some(DeferredWrite {
            resource_type: incoming.resource_type,
            payload: incoming.payload,
            created_at: incoming.created_at,
        });
        return AppendOutcome::Deferred;
    }

    let acknowledged = existing.status == OperationStatus::Completed;
    existing.resource_type =
        merged_resource_type(&existing.resource_type, incoming.resource_type, acknowledged);
    existing.payload = incoming.payload;
    existing.created_at = incoming.created_at;
    // Newer than anything deferred before a restart
    existing.deferred = None;
    reopen(existing);
    AppendOutcome::Replaced
}

/// An update to a record the remote has not acknowledged must still create it.
fn merged_resource_type(
    existing: &ResourceType,
    incoming: ResourceType,
    acknowledged: bool,
) -> ResourceType {
    if !acknowledged && existing.action() == Action::Insert && incoming.action() == Action::Update
    {
        incoming.with_action(Action::Insert)
    } else {
        incoming
    }
}

fn reopen(op: &mut Operation) {
    op.status = OperationStatus::Pending;
    op.last_error = None;
    op.failure = None;
}

fn apply_update(op: &mut Operation, update: OperationUpdate) -> Result<()> {
    if !op.status.can_transition_to(update.status) {
        return Err(Error::InvalidTransition {
            id: op.id.clone(),
            from: op.status.to_string(),
            to: update.status.to_string(),
        });
    }

    op.status = update.status;
    if update.status == OperationStatus::Failed {
        op.last_error = update.last_error;
        op.failure = update.failure;
    } else {
        op.last_error = None;
        op.failure = None;
    }
    if update.bump_retry {
        op.retry_count = op.retry_count.saturating_add(1);
    }

    if op.status.is_resolved() && op.deferred.is_some() {
        debug!(id = %op.id, "applying write deferred during the last attempt");
        let acknowledged = op.status == OperationStatus::Completed;
        fold_deferred(op, acknowledged);
    }
    Ok(())
}

/// Replaces the operation's write with its deferred one and reopens it.
fn fold_deferred(op: &mut Operation, acknowledged: bool) {
    if let Some(deferred) = op.deferred.take() {
        op.resource_type =
            merged_resource_type(&op.resource_type, deferred.resource_type, acknowledged);
        op.payload = deferred.payload;
        op.created_at = deferred.created_at;
        reopen(op);
    }
}

/// A [`QueueStore`] shared by the engine's components.
///
/// All mutations go through [`SharedStore::mutate`], which publishes fresh
/// counts to the [`StatusAggregator`] before releasing the lock. The lock
/// is never held across an `.await`.
#[derive(Clone)]
pub struct SharedStore {
    store: Arc<Mutex<QueueStore>>,
    status: StatusAggregator,
}

impl SharedStore {
    pub fn new(store: QueueStore) -> Self {
        let status = StatusAggregator::new(store.counts());
        SharedStore {
            store: Arc::new(Mutex::new(store)),
            status,
        }
    }

    pub fn read<R>(&self, f: impl FnOnce(&QueueStore) -> R) -> R {
        f(&self.lock())
    }

    pub fn mutate<R>(&self, f: impl FnOnce(&mut QueueStore) -> Result<R>) -> Result<R> {
        let mut store = self.lock();
        let result = f(&mut store);
        self.status.publish(store.counts());
        result
    }

    pub fn status(&self) -> &StatusAggregator {
        &self.status
    }

    fn lock(&self) -> MutexGuard<'_, QueueStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
