// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Offline mutation queue and reconciliation engine.
//!
//! # Architecture
//!
//! ```text
//!  add_operation ──► ┌────────────┐      ┌───────────┐      ┌──────────────┐
//!                    │ QueueStore │◄────►│ Processor │─────►│ RemoteData-  │
//!                    │ (dedup +   │      └───────────┘      │ Service      │
//!                    │  persist)  │            ▲            └──────────────┘
//!                    └────────────┘            │                   ▲
//!                          │            ┌──────┴─────┐      ┌──────┴───────┐
//!                          ▼            │ Scheduler  │◄─────│ Connectivity │
//!                    ┌────────────┐     │ (DrainGate)│      │ Monitor      │
//!                    │ Status     │     └────────────┘      └──────────────┘
//!                    │ Aggregator │
//!                    └────────────┘
//! ```
//!
//! - Every accepted write is persisted before `add_operation` returns
//! - At most one operation per id; later writes replace earlier ones in place
//! - One drain at a time, suppressed while offline
//! - A failure is isolated to its operation

mod connectivity;
mod engine;
mod processor;
mod remote;
mod retry;
mod scheduler;
mod status;
mod store;
mod transport;

pub use connectivity::{next_delay, ConnectivityConfig, ConnectivityMonitor};
pub use engine::{RetryOutcome, SyncEngine, SyncSettings};
pub use processor::{DrainReport, OperationResult, Outcome};
pub use remote::{RemoteDataService, RemoteError, RemoteFuture, RemoteResult, WebSocketRemote};
pub use retry::DEFAULT_MAX_RETRIES;
pub use scheduler::{
    Scheduler, SchedulerConfig, SchedulerHandle, SyncInterval, Trigger, TriggerOutcome,
};
pub use status::QueueCounts;
pub use store::{queue_key, AppendOutcome};
pub use transport::{Transport, TransportError, WebSocketTransport};

#[cfg(test)]
pub(crate) mod test_helpers;
