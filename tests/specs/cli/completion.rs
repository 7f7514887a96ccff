// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shell completion and top-level help.

#![allow(clippy::unwrap_used)]

#[path = "common.rs"]
mod common;

use common::*;

#[yare::parameterized(
    bash = { "bash" },
    zsh = { "zsh" },
    fish = { "fish" },
)]
fn completion_generates_script(shell: &str) {
    let out = Repsync::new().args(["completion", shell]).run();
    assert!(out.status.success());

    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("repsync"), "{shell} completion names the binary");
    for sub in ["add", "queue", "sync", "retry"] {
        assert!(stdout.contains(sub), "{shell} completion lists {sub}");
    }
}

#[test]
fn completion_ignores_broken_config() {
    Repsync::new()
        .env("REPSYNC_CONFIG", "/nonexistent/repsync.toml")
        .args(["completion", "bash"])
        .output()
        .success();
}

#[test]
fn completion_without_shell_shows_help() {
    Repsync::new()
        .arg("completion")
        .output()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn completion_invalid_shell_fails() {
    Repsync::new()
        .args(["completion", "tcsh"])
        .output()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn help_lists_commands_and_quickstart() {
    Repsync::new()
        .arg("--help")
        .output()
        .success()
        .stdout(predicate::str::contains("Queue:"))
        .stdout(predicate::str::contains("Sync:"))
        .stdout(predicate::str::contains("Get started:"));
}

#[test]
fn version_flag_prints_version() {
    Repsync::new()
        .arg("--version")
        .output()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}
