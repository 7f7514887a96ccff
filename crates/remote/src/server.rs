// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket server implementation.
//!
//! Each connection is served on its own task. Requests on a connection are
//! answered in order, one reply per request.

use std::net::SocketAddr;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use rp_core::protocol::{ClientMessage, ServerMessage};

use crate::state::ServerState;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Run the WebSocket server on the given address.
pub async fn run(addr: SocketAddr, state: ServerState) -> Result<(), BoxError> {
    let listener = TcpListener::bind(addr).await?;
    info!("Listening on: {}", addr);
    serve(listener, state).await
}

/// Accept connections from an already bound listener.
pub(crate) async fn serve(listener: TcpListener, state: ServerState) -> Result<(), BoxError> {
    loop {
        let (stream, peer_addr) = listener.accept().await?;
        let state = state.clone();

        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, peer_addr, state).await {
                error!("Connection error from {}: {}", peer_addr, e);
            }
        });
    }
}

/// Handle a single WebSocket connection.
async fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: ServerState,
) -> Result<(), BoxError> {
    let ws_stream = tokio_tungstenite::accept_async(stream).await?;
    info!("New WebSocket connection from: {}", peer_addr);

    let (mut ws_sink, mut ws_stream) = ws_stream.split();

    while let Some(msg) = ws_stream.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                let reply = handle_client_message(&text, &state).await;
                ws_sink.send(Message::Text(reply.to_json()?.into())).await?;
            }
            Ok(Message::Close(_)) => {
                info!("Client {} disconnected", peer_addr);
                break;
            }
            Ok(Message::Ping(data)) => {
                ws_sink.send(Message::Pong(data)).await?;
            }
            Ok(_) => {
                // Binary and pong frames carry nothing for us
            }
            Err(e) => {
                warn!("WebSocket error from {}: {}", peer_addr, e);
                break;
            }
        }
    }

    info!("Connection closed: {}", peer_addr);
    Ok(())
}

/// Decode one request and build its reply. Unreadable requests get an
/// `error` reply, which the client treats as permanent.
pub(crate) async fn handle_client_message(text: &str, state: &ServerState) -> ServerMessage {
    match ClientMessage::from_json(text) {
        Ok(msg) => {
            debug!("Received message: {:?}", msg);
            state.apply(msg).await
        }
        Err(e) => {
            warn!(error = %e, "unreadable request");
            ServerMessage::error(format!("unreadable request: {e}"))
        }
    }
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
