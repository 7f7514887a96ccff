// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Helpers shared by the CLI specs.
//!
//! # Core Types
//! - [`Workspace`] - isolated config and data directory
//! - [`Repsync`] - CLI command builder bound to a workspace

// Shared across test files; not every file uses every helper.
#![allow(dead_code)]
#![allow(unused_imports)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::path::PathBuf;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use tempfile::TempDir;

pub use predicates::prelude::*;
pub use similar_asserts::assert_eq;

/// Nothing listens on port 1, so connections are refused at once.
pub const UNREACHABLE_URL: &str = "ws://127.0.0.1:1";

/// An isolated config file and data directory.
pub struct Workspace {
    _temp: TempDir,
    root: PathBuf,
}

impl Workspace {
    /// Workspace whose remote is unreachable.
    pub fn new() -> Self {
        Self::with_config("")
    }

    /// Workspace with extra top-level TOML added to the generated config.
    pub fn with_config(extra: &str) -> Self {
        let temp = TempDir::new().expect("failed to create temp dir");
        let root = temp.path().to_path_buf();
        let data = root.join("data");
        let config = format!(
            "user_id = \"tester\"\ndata_dir = {data:?}\n{extra}\n\n[remote]\nurl = \"{UNREACHABLE_URL}\"\nconnect_timeout_ms = 500\n"
        );
        std::fs::write(root.join("config.toml"), config).expect("failed to write config");
        Workspace { _temp: temp, root }
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join("config.toml")
    }

    pub fn data_dir(&self) -> PathBuf {
        self.root.join("data")
    }

    /// File holding the `tester` user's queue.
    pub fn queue_file(&self) -> PathBuf {
        self.data_dir().join("sync_queue_tester.json")
    }

    pub fn repsync(&self) -> Repsync {
        Repsync::in_workspace(self)
    }

    /// Queues `id` as a `workouts:insert` and checks it succeeded.
    pub fn add(&self, id: &str, payload: &str) {
        self.repsync()
            .args(["add", "workouts:insert", id, "--payload", payload])
            .output()
            .success();
    }

    /// Parsed `queue -o json` output.
    pub fn queue_json(&self) -> serde_json::Value {
        let out = self.repsync().args(["queue", "-o", "json"]).run();
        assert!(out.status.success(), "queue failed: {out:?}");
        serde_json::from_slice(&out.stdout).expect("queue output is not json")
    }

    /// Ids in queue order.
    pub fn queue_ids(&self) -> Vec<String> {
        self.queue_json()["operations"]
            .as_array()
            .expect("operations array")
            .iter()
            .map(|op| op["id"].as_str().expect("id").to_string())
            .collect()
    }

    /// Status of `id` from `queue -o json`.
    pub fn status_of(&self, id: &str) -> String {
        self.queue_json()["operations"]
            .as_array()
            .expect("operations array")
            .iter()
            .find(|op| op["id"] == id)
            .and_then(|op| op["status"].as_str())
            .expect("operation not queued")
            .to_string()
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

/// CLI command builder for the repsync binary.
pub struct Repsync {
    cmd: Command,
}

impl Repsync {
    /// A command with no workspace; only for config-free commands.
    pub fn new() -> Self {
        let mut cmd = cargo_bin_cmd!("repsync");
        cmd.env("NO_COLOR", "1")
            .env_remove("COLOR")
            .env_remove("REPSYNC_CONFIG")
            .env_remove("REPSYNC_DATA_DIR")
            .env_remove("REPSYNC_LOG");
        Self { cmd }
    }

    pub fn in_workspace(ws: &Workspace) -> Self {
        let mut this = Self::new();
        this.cmd.env("REPSYNC_CONFIG", ws.config_path());
        this
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.cmd.arg(arg);
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        self.cmd.args(args);
        self
    }

    pub fn env(mut self, key: &str, val: impl AsRef<std::ffi::OsStr>) -> Self {
        self.cmd.env(key, val);
        self
    }

    /// Execute and get assert handle.
    pub fn output(mut self) -> assert_cmd::assert::Assert {
        self.cmd.assert()
    }

    /// Execute and get raw output.
    pub fn run(mut self) -> std::process::Output {
        self.cmd.output().expect("failed to execute repsync")
    }
}

impl Default for Repsync {
    fn default() -> Self {
        Self::new()
    }
}
