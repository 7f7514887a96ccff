// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Queued mutations awaiting reconciliation with the remote service.
//!
//! An [`Operation`] is the unit of the offline queue. Its payload is opaque
//! JSON; the engine only looks at the [`ResourceType`] to choose which
//! remote capability to invoke and at the `id` to deduplicate.
//!
//! Operations are persisted as camelCase JSON. Unknown fields are ignored
//! and newer optional fields default, so queues written by other versions
//! stay readable.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// The remote capability an operation invokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Insert,
    Update,
    Delete,
}

impl Action {
    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Insert => "insert",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Action {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "insert" | "create" | "add" => Ok(Action::Insert),
            "update" | "edit" => Ok(Action::Update),
            "delete" | "remove" => Ok(Action::Delete),
            _ => Err(Error::InvalidResourceType(s.to_string())),
        }
    }
}

/// Identifies a remote resource collection and the action to perform on it.
///
/// Written as `<resource>:<action>`, e.g. `workouts:insert` or
/// `body_measurements:delete`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceType {
    resource: String,
    action: Action,
}

impl ResourceType {
    /// Creates a resource type, validating the resource name.
    pub fn new(resource: impl Into<String>, action: Action) -> Result<Self> {
        let resource = resource.into();
        if !is_valid_resource_name(&resource) {
            return Err(Error::InvalidResourceType(format!("{resource}:{action}")));
        }
        Ok(ResourceType { resource, action })
    }

    pub fn insert(resource: impl Into<String>) -> Result<Self> {
        Self::new(resource, Action::Insert)
    }

    pub fn update(resource: impl Into<String>) -> Result<Self> {
        Self::new(resource, Action::Update)
    }

    pub fn delete(resource: impl Into<String>) -> Result<Self> {
        Self::new(resource, Action::Delete)
    }

    /// The remote collection name.
    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn action(&self) -> Action {
        self.action
    }

    /// Returns a copy of this resource type with a different action.
    pub fn with_action(&self, action: Action) -> Self {
        ResourceType {
            resource: self.resource.clone(),
            action,
        }
    }
}

/// Resource names are non-empty lowercase identifiers.
fn is_valid_resource_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.resource, self.action)
    }
}

impl FromStr for ResourceType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (resource, action) = s
            .split_once(':')
            .ok_or_else(|| Error::InvalidResourceType(s.to_string()))?;
        let action: Action = action
            .parse()
            .map_err(|_| Error::InvalidResourceType(s.to_string()))?;
        let resource = resource.trim().to_lowercase();
        if !is_valid_resource_name(&resource) {
            return Err(Error::InvalidResourceType(s.to_string()));
        }
        Ok(ResourceType { resource, action })
    }
}

impl TryFrom<String> for ResourceType {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ResourceType> for String {
    fn from(value: ResourceType) -> Self {
        value.to_string()
    }
}

/// Lifecycle state of a queued operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    /// Waiting for the next drain. Initial state.
    Pending,
    /// Currently being sent to the remote service.
    Syncing,
    /// Acknowledged by the remote service; kept until cleared.
    Completed,
    /// The last attempt failed; see `last_error`.
    Failed,
}

impl OperationStatus {
    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationStatus::Pending => "pending",
            OperationStatus::Syncing => "syncing",
            OperationStatus::Completed => "completed",
            OperationStatus::Failed => "failed",
        }
    }

    /// Check if a transition from this status to target is allowed.
    ///
    /// Transitions only move forward, except `failed -> pending` (retry).
    pub fn can_transition_to(&self, target: OperationStatus) -> bool {
        use OperationStatus::*;
        matches!(
            (self, target),
            (Pending, Syncing)
                | (Syncing, Completed)
                | (Syncing, Failed)
                | (Failed, Pending)
        )
    }

    /// Returns true if the engine will not touch this operation again on its own.
    pub fn is_resolved(&self) -> bool {
        matches!(self, OperationStatus::Completed | OperationStatus::Failed)
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OperationStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(OperationStatus::Pending),
            "syncing" => Ok(OperationStatus::Syncing),
            "completed" => Ok(OperationStatus::Completed),
            "failed" => Ok(OperationStatus::Failed),
            _ => Err(Error::InvalidStatus(s.to_string())),
        }
    }
}

/// Classification of a remote failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Network or server-side failure; retrying may succeed.
    Transient,
    /// The remote rejected the mutation (validation, conflict). Retrying
    /// the same payload is not expected to help.
    Permanent,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Transient => "transient",
            FailureKind::Permanent => "permanent",
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, FailureKind::Transient)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A write that arrived for an id while that id was in flight.
///
/// Applied once the in-flight attempt resolves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeferredWrite {
    pub resource_type: ResourceType,
    pub payload: Value,
    pub created_at: u64,
}

/// A single queued mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    /// Client-generated id of the logical record; dedup and idempotency key.
    pub id: String,
    pub resource_type: ResourceType,
    /// Mutation body, never interpreted by the engine.
    #[serde(default)]
    pub payload: Value,
    #[serde(default = "default_status")]
    pub status: OperationStatus,
    /// Logical timestamp in milliseconds. Callers must supply monotonic values.
    #[serde(default)]
    pub created_at: u64,
    /// Retries granted since the operation was enqueued.
    #[serde(default)]
    pub retry_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deferred: Option<DeferredWrite>,
}

fn default_status() -> OperationStatus {
    OperationStatus::Pending
}

impl Operation {
    /// Creates a new pending operation.
    pub fn new(
        id: impl Into<String>,
        resource_type: ResourceType,
        payload: Value,
        created_at: u64,
    ) -> Self {
        Operation {
            id: id.into(),
            resource_type,
            payload,
            status: OperationStatus::Pending,
            created_at,
            retry_count: 0,
            last_error: None,
            failure: None,
            deferred: None,
        }
    }

    /// Rejects operations without an id or resource. The payload is opaque.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::Validation("id is required".to_string()));
        }
        if self.resource_type.resource().is_empty() {
            return Err(Error::Validation("resource type is required".to_string()));
        }
        Ok(())
    }

    pub fn is_pending(&self) -> bool {
        self.status == OperationStatus::Pending
    }

    pub fn is_failed(&self) -> bool {
        self.status == OperationStatus::Failed
    }

    /// True when the last failure was classified as permanent.
    ///
    /// Such operations should be discarded rather than retried, though a
    /// forced retry is still allowed.
    pub fn is_permanent_failure(&self) -> bool {
        self.is_failed() && self.failure == Some(FailureKind::Permanent)
    }
}

#[cfg(test)]
#[path = "operation_tests.rs"]
mod tests;
