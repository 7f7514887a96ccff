// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for rp-core operations.

use thiserror::Error;

/// All possible errors that can occur in rp-core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The operation was rejected before it reached storage.
    #[error("invalid operation: {0}")]
    Validation(String),

    #[error("invalid resource type: '{0}'\n  hint: expected '<resource>:<action>' where action is insert, update or delete (e.g. workouts:insert)")]
    InvalidResourceType(String),

    #[error("invalid status: '{0}'\n  hint: valid statuses are: pending, syncing, completed, failed")]
    InvalidStatus(String),

    #[error("invalid sync interval: {0}\n  hint: valid intervals are 30, 60, 300 or -1 (manual only)")]
    InvalidInterval(i64),

    #[error("operation not found: {0}")]
    OperationNotFound(String),

    #[error("retry limit reached for {id} ({max_retries} retries)\n  hint: discard it with 'repsync discard {id}'")]
    RetryLimitReached { id: String, max_retries: u32 },

    #[error("invalid status transition for {id}: cannot go from {from} to {to}")]
    InvalidTransition {
        id: String,
        from: String,
        to: String,
    },

    /// The durable write failed; the mutation is not safely queued.
    #[error("storage error: {0}")]
    Storage(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns true if this error came from the persistence layer.
    ///
    /// Storage errors are the only errors that abort a drain.
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            Error::Storage(_) | Error::Database(_) | Error::Io(_)
        )
    }
}

/// A specialized Result type for rp-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
