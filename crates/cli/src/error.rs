// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use thiserror::Error;

/// All possible errors that can occur in the repsync CLI.
///
/// Errors provide user-friendly messages with hints for common issues.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] rp_core::Error),

    #[error("invalid payload: {0}\n  hint: pass a JSON object, e.g. --payload '{{\"name\":\"legs\"}}'")]
    InvalidPayload(String),

    #[error("operation id cannot be empty")]
    EmptyId,

    #[error("nothing to discard\n  hint: pass an operation id or --all-failed")]
    NothingToDiscard,

    #[error("failed to read config {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        source: Box<toml::de::Error>,
    },

    #[error("config error: {0}")]
    Config(String),

    #[error("some operations failed: {succeeded} succeeded, {failed} failed\n  hint: inspect them with 'repsync queue' and retry with 'repsync retry'")]
    DrainIncomplete { succeeded: usize, failed: usize },

    #[error("runtime error: {0}")]
    Runtime(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for repsync operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
