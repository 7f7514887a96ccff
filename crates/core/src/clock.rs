// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Monotonic logical timestamps for queued operations.
//!
//! Last-writer-wins on duplicate ids only behaves when callers stamp
//! operations with non-decreasing `created_at` values. [`MonotonicClock`]
//! hands out wall-clock milliseconds that never repeat and never go
//! backwards, even if the system clock is adjusted.

use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// Trait for getting the current wall clock time.
///
/// This allows injecting a mock clock for testing.
pub trait ClockSource: Send + Sync {
    /// Returns the current time in milliseconds since Unix epoch.
    fn now_ms(&self) -> u64;
}

/// System clock implementation using `std::time::SystemTime`.
#[derive(Debug, Default)]
pub struct SystemClock;

impl ClockSource for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or(0)
    }
}

impl<C: ClockSource> ClockSource for &C {
    fn now_ms(&self) -> u64 {
        (*self).now_ms()
    }
}

/// Generates strictly increasing millisecond timestamps.
pub struct MonotonicClock<C: ClockSource = SystemClock> {
    clock: C,
    last_ms: Mutex<u64>,
}

impl MonotonicClock<SystemClock> {
    /// Creates a monotonic clock backed by the system clock.
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for MonotonicClock<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ClockSource> MonotonicClock<C> {
    /// Creates a monotonic clock with a custom clock source.
    pub fn with_clock(clock: C) -> Self {
        MonotonicClock {
            clock,
            last_ms: Mutex::new(0),
        }
    }

    /// Returns a timestamp greater than every timestamp returned or observed before.
    pub fn now(&self) -> u64 {
        let physical = self.clock.now_ms();
        let mut last = self.last_ms.lock().unwrap_or_else(|e| e.into_inner());
        let next = if physical > *last {
            physical
        } else {
            last.saturating_add(1)
        };
        *last = next;
        next
    }

    /// Advances the clock past a timestamp seen elsewhere (e.g. loaded from disk).
    pub fn observe(&self, seen_ms: u64) {
        let mut last = self.last_ms.lock().unwrap_or_else(|e| e.into_inner());
        if seen_ms > *last {
            *last = seen_ms;
        }
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
