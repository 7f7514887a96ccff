// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The remote data service port.
//!
//! The engine never talks to the network directly. It dispatches each
//! queued operation to a [`RemoteDataService`], which must treat a repeated
//! insert with the same key as the same record (delivery is at-least-once).

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use rp_core::protocol::{ClientMessage, ServerMessage};
use rp_core::FailureKind;
use serde_json::Value;
use tokio::sync::Mutex;

use super::transport::{Transport, TransportError, WebSocketTransport};

/// Failure reported by a remote call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RemoteError {
    /// Network or server-side failure. Retrying may succeed.
    #[error("{0}")]
    Transient(String),

    /// The remote refused the mutation. Retrying the same payload will not help.
    #[error("rejected: {0}")]
    Permanent(String),

    #[error("request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
}

impl RemoteError {
    pub fn kind(&self) -> FailureKind {
        match self {
            RemoteError::Permanent(_) => FailureKind::Permanent,
            RemoteError::Transient(_) | RemoteError::Timeout(_) => FailureKind::Transient,
        }
    }

    fn rejected(kind: FailureKind, message: String) -> Self {
        match kind {
            FailureKind::Permanent => RemoteError::Permanent(message),
            FailureKind::Transient => RemoteError::Transient(message),
        }
    }
}

impl From<TransportError> for RemoteError {
    fn from(e: TransportError) -> Self {
        match e {
            // A frame we cannot read will not become readable on retry
            TransportError::Malformed(msg) => RemoteError::Permanent(msg),
            other => RemoteError::Transient(other.to_string()),
        }
    }
}

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Boxed future returned by [`RemoteDataService`] methods.
pub type RemoteFuture<'a, T> = Pin<Box<dyn Future<Output = RemoteResult<T>> + Send + 'a>>;

/// Remote capabilities the processor dispatches to, keyed by action.
pub trait RemoteDataService: Send + Sync {
    /// Creates a record. `key` is the operation id and doubles as the
    /// idempotency key. Returns the remote record id.
    fn insert(&self, resource: String, key: String, payload: Value) -> RemoteFuture<'_, String>;

    fn update(&self, resource: String, id: String, payload: Value) -> RemoteFuture<'_, ()>;

    /// Deletes a record. Deleting a missing record must succeed.
    fn delete(&self, resource: String, id: String) -> RemoteFuture<'_, ()>;

    /// Cheap liveness check used for connectivity detection.
    fn probe(&self) -> RemoteFuture<'_, ()>;
}

/// [`RemoteDataService`] speaking the rp-core protocol over a [`Transport`].
///
/// Requests are serialized: one request is in flight at a time and replies
/// are matched by `request_id`. Replies to abandoned requests (e.g. after a
/// timeout) are skipped.
pub struct WebSocketRemote<T: Transport = WebSocketTransport> {
    url: String,
    transport: Mutex<T>,
    next_request_id: AtomicU64,
}

impl WebSocketRemote<WebSocketTransport> {
    pub fn new(url: impl Into<String>, connect_timeout: Duration) -> Self {
        Self::with_transport(url, WebSocketTransport::new(connect_timeout))
    }
}

impl<T: Transport> WebSocketRemote<T> {
    /// Creates a remote over a custom transport (for testing).
    pub fn with_transport(url: impl Into<String>, transport: T) -> Self {
        WebSocketRemote {
            url: url.into(),
            transport: Mutex::new(transport),
            next_request_id: AtomicU64::new(1),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn next_id(&self) -> u64 {
        self.next_request_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Sends one request and waits for the reply carrying its id.
    async fn request(&self, msg: ClientMessage) -> RemoteResult<ServerMessage> {
        let mut transport = self.transport.lock().await;
        if !transport.is_connected() {
            transport.connect(&self.url).await?;
        }

        let request_id = msg.request_id();
        if let Err(e) = transport.send(msg).await {
            let _ = transport.disconnect().await;
            return Err(e.into());
        }

        loop {
            match transport.recv().await {
                Ok(Some(reply)) if reply.request_id() == Some(request_id) => return Ok(reply),
                Ok(Some(ServerMessage::Error { message })) => {
                    return Err(RemoteError::Permanent(message));
                }
                Ok(Some(stale)) => {
                    tracing::debug!(request_id, ?stale, "skipping reply to an earlier request");
                }
                Ok(None) => {
                    let _ = transport.disconnect().await;
                    return Err(RemoteError::Transient(
                        "connection closed by remote".to_string(),
                    ));
                }
                Err(e) => {
                    let _ = transport.disconnect().await;
                    return Err(e.into());
                }
            }
        }
    }
}

fn unexpected(reply: ServerMessage) -> RemoteError {
    RemoteError::Transient(format!("unexpected reply: {reply:?}"))
}

impl<T: Transport + 'static> RemoteDataService for WebSocketRemote<T> {
    fn insert(&self, resource: String, key: String, payload: Value) -> RemoteFuture<'_, String> {
        Box::pin(async move {
            let msg = ClientMessage::insert(self.next_id(), resource, key, payload);
            match self.request(msg).await? {
                ServerMessage::Inserted { id, .. } => Ok(id),
                ServerMessage::Rejected { kind, message, .. } => {
                    Err(RemoteError::rejected(kind, message))
                }
                other => Err(unexpected(other)),
            }
        })
    }

    fn update(&self, resource: String, id: String, payload: Value) -> RemoteFuture<'_, ()> {
        Box::pin(async move {
            let msg = ClientMessage::update(self.next_id(), resource, id, payload);
            match self.request(msg).await? {
                ServerMessage::Ack { .. } => Ok(()),
                ServerMessage::Rejected { kind, message, .. } => {
                    Err(RemoteError::rejected(kind, message))
                }
                other => Err(unexpected(other)),
            }
        })
    }

    fn delete(&self, resource: String, id: String) -> RemoteFuture<'_, ()> {
        Box::pin(async move {
            let msg = ClientMessage::delete(self.next_id(), resource, id);
            match self.request(msg).await? {
                ServerMessage::Ack { .. } => Ok(()),
                ServerMessage::Rejected { kind, message, .. } => {
                    Err(RemoteError::rejected(kind, message))
                }
                other => Err(unexpected(other)),
            }
        })
    }

    fn probe(&self) -> RemoteFuture<'_, ()> {
        Box::pin(async move {
            match self.request(ClientMessage::ping(self.next_id())).await? {
                ServerMessage::Pong { .. } => Ok(()),
                other => Err(unexpected(other)),
            }
        })
    }
}

#[cfg(test)]
#[path = "remote_tests.rs"]
mod tests;
