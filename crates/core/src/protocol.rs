// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket protocol messages between the sync engine and the remote data service.
//!
//! The protocol is request/response:
//! - Client sends one insert, update or delete at a time, tagged with a `request_id`
//! - Server answers with `inserted`, `ack` or `rejected` carrying the same `request_id`
//!
//! Inserts carry the operation id as an idempotency `key`; the server must
//! treat a repeated key as the same record.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::operation::FailureKind;

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Create a record. Repeated delivery of the same key must be safe.
    Insert {
        request_id: u64,
        resource: String,
        key: String,
        payload: Value,
    },

    /// Replace the body of an existing record.
    Update {
        request_id: u64,
        resource: String,
        id: String,
        payload: Value,
    },

    /// Delete a record. Deleting a missing record succeeds.
    Delete {
        request_id: u64,
        resource: String,
        id: String,
    },

    /// Ping message for liveness probes.
    Ping {
        /// Client-chosen ID echoed in Pong.
        id: u64,
    },
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Insert accepted; `id` is the remote record id.
    Inserted { request_id: u64, id: String },

    /// Update or delete accepted.
    Ack { request_id: u64 },

    /// The request was not applied.
    Rejected {
        request_id: u64,
        kind: FailureKind,
        message: String,
    },

    /// Pong response to client Ping.
    Pong {
        /// Echoed from the Ping message.
        id: u64,
    },

    /// The request could not be read at all.
    Error {
        /// Human-readable error description.
        message: String,
    },
}

impl ClientMessage {
    /// Creates an Insert message.
    pub fn insert(
        request_id: u64,
        resource: impl Into<String>,
        key: impl Into<String>,
        payload: Value,
    ) -> Self {
        ClientMessage::Insert {
            request_id,
            resource: resource.into(),
            key: key.into(),
            payload,
        }
    }

    /// Creates an Update message.
    pub fn update(
        request_id: u64,
        resource: impl Into<String>,
        id: impl Into<String>,
        payload: Value,
    ) -> Self {
        ClientMessage::Update {
            request_id,
            resource: resource.into(),
            id: id.into(),
            payload,
        }
    }

    /// Creates a Delete message.
    pub fn delete(request_id: u64, resource: impl Into<String>, id: impl Into<String>) -> Self {
        ClientMessage::Delete {
            request_id,
            resource: resource.into(),
            id: id.into(),
        }
    }

    /// Creates a Ping message.
    pub fn ping(id: u64) -> Self {
        ClientMessage::Ping { id }
    }

    /// Returns the correlation id the server will echo back.
    pub fn request_id(&self) -> u64 {
        match self {
            ClientMessage::Insert { request_id, .. }
            | ClientMessage::Update { request_id, .. }
            | ClientMessage::Delete { request_id, .. } => *request_id,
            ClientMessage::Ping { id } => *id,
        }
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    /// Creates an Inserted message.
    pub fn inserted(request_id: u64, id: impl Into<String>) -> Self {
        ServerMessage::Inserted {
            request_id,
            id: id.into(),
        }
    }

    /// Creates an Ack message.
    pub fn ack(request_id: u64) -> Self {
        ServerMessage::Ack { request_id }
    }

    /// Creates a Rejected message.
    pub fn rejected(request_id: u64, kind: FailureKind, message: impl Into<String>) -> Self {
        ServerMessage::Rejected {
            request_id,
            kind,
            message: message.into(),
        }
    }

    /// Creates a Pong message.
    pub fn pong(id: u64) -> Self {
        ServerMessage::Pong { id }
    }

    /// Creates an Error message.
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }

    /// Returns the correlation id this message answers, if any.
    pub fn request_id(&self) -> Option<u64> {
        match self {
            ServerMessage::Inserted { request_id, .. }
            | ServerMessage::Ack { request_id }
            | ServerMessage::Rejected { request_id, .. } => Some(*request_id),
            ServerMessage::Pong { id } => Some(*id),
            ServerMessage::Error { .. } => None,
        }
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
