// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! rp-core: Shared library for the repsync offline mutation queue
//!
//! This crate provides the operation model, persistence backends, wire
//! protocol, and clock primitives used by both the repsync CLI and the
//! rp-remote reference server.

pub mod clock;
pub mod error;
pub mod operation;
pub mod persist;
pub mod protocol;

pub use clock::{ClockSource, MonotonicClock, SystemClock};
pub use error::{Error, Result};
pub use operation::{
    Action, DeferredWrite, FailureKind, Operation, OperationStatus, ResourceType,
};
pub use persist::{FilePersistence, MemoryPersistence, PersistencePort, SqlitePersistence};
pub use protocol::{ClientMessage, ServerMessage};
