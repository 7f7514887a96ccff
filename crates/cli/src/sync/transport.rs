// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Message transport between the engine and the remote data service.
//!
//! [`Transport`] moves whole protocol messages; framing, connection setup
//! and teardown live behind it so that [`WebSocketRemote`](super::remote::WebSocketRemote)
//! can be exercised with an in-memory transport.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use rp_core::protocol::{ClientMessage, ServerMessage};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

/// Error type for transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("connection to {url} failed: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("connection to {0} timed out")]
    ConnectTimeout(String),

    #[error("not connected")]
    NotConnected,

    #[error("connection closed")]
    ConnectionClosed,

    #[error("send failed: {0}")]
    SendFailed(String),

    #[error("receive failed: {0}")]
    ReceiveFailed(String),

    #[error("malformed message: {0}")]
    Malformed(String),
}

pub type TransportResult<T> = Result<T, TransportError>;

/// Boxed future returned by [`Transport`] methods.
pub type TransportFuture<'a, T> = Pin<Box<dyn Future<Output = TransportResult<T>> + Send + 'a>>;

/// A bidirectional, message-oriented connection.
pub trait Transport: Send {
    /// Opens a connection, replacing any existing one.
    fn connect(&mut self, url: &str) -> TransportFuture<'_, ()>;

    /// Closes the connection. Closing a closed transport is a no-op.
    fn disconnect(&mut self) -> TransportFuture<'_, ()>;

    fn send(&mut self, msg: ClientMessage) -> TransportFuture<'_, ()>;

    /// Waits for the next server message. `None` means the peer closed.
    fn recv(&mut self) -> TransportFuture<'_, Option<ServerMessage>>;

    fn is_connected(&self) -> bool;
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket transport using tokio-tungstenite text frames.
pub struct WebSocketTransport {
    ws: Option<WsStream>,
    connect_timeout: Duration,
}

impl WebSocketTransport {
    pub fn new(connect_timeout: Duration) -> Self {
        WebSocketTransport {
            ws: None,
            connect_timeout,
        }
    }

    /// Drops a broken connection so the next request reconnects.
    fn reset(&mut self) {
        self.ws = None;
    }
}

impl Default for WebSocketTransport {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

impl Transport for WebSocketTransport {
    fn connect(&mut self, url: &str) -> TransportFuture<'_, ()> {
        let url = url.to_string();
        Box::pin(async move {
            self.reset();
            let attempt = tokio_tungstenite::connect_async(url.as_str());
            let (ws, _) = tokio::time::timeout(self.connect_timeout, attempt)
                .await
                .map_err(|_| TransportError::ConnectTimeout(url.clone()))?
                .map_err(|e| TransportError::ConnectionFailed {
                    url: url.clone(),
                    reason: e.to_string(),
                })?;
            tracing::debug!(%url, "websocket connected");
            self.ws = Some(ws);
            Ok(())
        })
    }

    fn disconnect(&mut self) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            if let Some(mut ws) = self.ws.take() {
                // Peer may already be gone
                let _ = ws.close(None).await;
            }
            Ok(())
        })
    }

    fn send(&mut self, msg: ClientMessage) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            let json = msg
                .to_json()
                .map_err(|e| TransportError::Malformed(e.to_string()))?;
            let ws = self.ws.as_mut().ok_or(TransportError::NotConnected)?;

            // send() flushes, which surfaces a dead socket here rather than on recv
            if let Err(e) = ws.send(Message::Text(json.into())).await {
                self.reset();
                return Err(TransportError::SendFailed(e.to_string()));
            }
            Ok(())
        })
    }

    fn recv(&mut self) -> TransportFuture<'_, Option<ServerMessage>> {
        Box::pin(async move {
            let ws = self.ws.as_mut().ok_or(TransportError::NotConnected)?;

            loop {
                let frame = match ws.next().await {
                    Some(Ok(frame)) => frame,
                    Some(Err(e)) => {
                        self.reset();
                        return Err(TransportError::ReceiveFailed(e.to_string()));
                    }
                    None => {
                        self.reset();
                        return Ok(None);
                    }
                };

                match frame {
                    Message::Text(text) => {
                        return ServerMessage::from_json(&text)
                            .map(Some)
                            .map_err(|e| TransportError::Malformed(e.to_string()));
                    }
                    Message::Close(_) => {
                        self.reset();
                        return Ok(None);
                    }
                    // Control frames are answered by tungstenite itself
                    _ => continue,
                }
            }
        })
    }

    fn is_connected(&self) -> bool {
        self.ws.is_some()
    }
}

#[cfg(test)]
#[path = "transport_tests.rs"]
mod tests;
