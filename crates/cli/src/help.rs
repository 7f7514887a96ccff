// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Help text generation with colorization support.

use crate::colors;
use clap::builder::styling::Styles;

/// clap styles matching the [`colors`] palette.
pub fn styles() -> Styles {
    if !colors::should_colorize() {
        return Styles::plain();
    }

    use anstyle::{Ansi256Color, Color, Style};

    let fg = |code| Style::new().fg_color(Some(Color::Ansi256(Ansi256Color(code))));
    let header = fg(colors::codes::HEADER);
    let context = fg(colors::codes::CONTEXT);

    Styles::styled()
        .header(header)
        .usage(header)
        .literal(fg(colors::codes::LITERAL))
        .placeholder(context)
        .valid(context)
        .error(fg(colors::codes::FAILED))
}

/// Main help template with colorized Options header.
pub fn template() -> String {
    format!(
        "{{about-with-newline}}
{{usage-heading}} {{usage}}

{{before-help}}{}
{{options}}{{after-help}}",
        colors::header("Options:")
    )
}

const QUEUE_COMMANDS: &[(&str, &str)] = &[
    ("add", "Queue a mutation"),
    ("queue", "List queued operations in order"),
    ("status", "Show queue counts"),
    ("discard", "Remove failed operations"),
    ("clear", "Remove completed operations"),
];

const SYNC_COMMANDS: &[(&str, &str)] = &[
    ("sync", "Drain the queue against the remote once"),
    ("retry", "Requeue failed operations and drain"),
    ("watch", "Keep syncing until interrupted"),
    ("completion", "Generate shell completions"),
];

/// Commands list shown before options in main help.
pub fn commands() -> String {
    let width = QUEUE_COMMANDS
        .iter()
        .chain(SYNC_COMMANDS)
        .map(|(name, _)| name.len())
        .max()
        .unwrap_or(0);

    let section = |title: &str, entries: &[(&str, &str)]| {
        let mut out = colors::header(title);
        for (name, about) in entries {
            let pad = " ".repeat(width - name.len() + 2);
            out.push_str(&format!("\n  {}{pad}{about}", colors::literal(name)));
        }
        out
    };

    format!(
        "{}\n\n{}",
        section("Queue:", QUEUE_COMMANDS),
        section("Sync:", SYNC_COMMANDS)
    )
}

/// Quickstart help shown after options in main help.
pub fn quickstart() -> String {
    colors::examples(
        "\
Get started:
  repsync add workouts:insert w1 -p '{\"name\":\"legs\"}'   Queue a write
  repsync queue                                         See what is pending
  repsync sync                                          Push it to the remote
  repsync watch                                         Sync in the background",
    )
}

#[cfg(test)]
#[path = "help_tests.rs"]
mod tests;
