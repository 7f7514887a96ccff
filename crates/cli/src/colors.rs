// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Terminal colors for help and queue output.
//!
//! Respects environment variables:
//! - `NO_COLOR=1`: Disables colors
//! - `COLOR=1`: Forces colors even without TTY

use std::io::IsTerminal;

use rp_core::OperationStatus;

use crate::env;

/// ANSI 256-color codes.
pub mod codes {
    /// Section headers: steel blue
    pub const HEADER: u8 = 74;
    /// Commands/literals: light grey
    pub const LITERAL: u8 = 250;
    /// Defaults, placeholders, descriptions: medium grey
    pub const CONTEXT: u8 = 245;

    pub const PENDING: u8 = 179;
    pub const SYNCING: u8 = 75;
    pub const COMPLETED: u8 = 108;
    pub const FAILED: u8 = 167;
}

const RESET: &str = "\x1b[0m";

/// Check if colors should be enabled based on TTY and environment variables.
pub fn should_colorize() -> bool {
    if env::no_color() {
        return false;
    }
    if env::force_color() {
        return true;
    }
    std::io::stdout().is_terminal()
}

/// Wraps `text` in a 256-color foreground escape.
pub fn paint(code: u8, text: &str) -> String {
    format!("\x1b[38;5;{code}m{text}{RESET}")
}

fn paint_if(code: u8, text: &str) -> String {
    if should_colorize() {
        paint(code, text)
    } else {
        text.to_string()
    }
}

pub fn header(text: &str) -> String {
    paint_if(codes::HEADER, text)
}

pub fn literal(text: &str) -> String {
    paint_if(codes::LITERAL, text)
}

pub fn context(text: &str) -> String {
    paint_if(codes::CONTEXT, text)
}

/// Color code for an operation status.
pub fn status_code(status: OperationStatus) -> u8 {
    match status {
        OperationStatus::Pending => codes::PENDING,
        OperationStatus::Syncing => codes::SYNCING,
        OperationStatus::Completed => codes::COMPLETED,
        OperationStatus::Failed => codes::FAILED,
    }
}

/// Status label, colored when the terminal allows it.
pub fn status(status: OperationStatus) -> String {
    paint_if(status_code(status), status.as_str())
}

/// Colorize an examples help block.
///
/// Lines ending in `:` are headers. Other lines split at the first run of
/// two or more spaces into a command (literal) and a description (as-is).
pub fn examples(text: &str) -> String {
    if !should_colorize() {
        return text.to_string();
    }
    text.lines()
        .map(example_line)
        .collect::<Vec<_>>()
        .join("\n")
}

fn example_line(line: &str) -> String {
    let trimmed = line.trim_start();
    let indent = &line[..line.len() - trimmed.len()];

    if trimmed.ends_with(':') && !trimmed.contains("  ") {
        return format!("{indent}{}", paint(codes::HEADER, trimmed));
    }
    match split_description(trimmed) {
        Some((cmd, desc)) => format!("{indent}{}{desc}", paint(codes::LITERAL, cmd)),
        None => line.to_string(),
    }
}

/// Splits `cmd    description` at the first gap of two or more spaces.
pub fn split_description(line: &str) -> Option<(&str, &str)> {
    let gap = line.find("  ")?;
    let rest = &line[gap..];
    let desc_start = gap + (rest.len() - rest.trim_start().len());
    if desc_start >= line.len() {
        return None;
    }
    Some((&line[..gap], &line[gap..]))
}

#[cfg(test)]
#[path = "colors_tests.rs"]
mod tests;
