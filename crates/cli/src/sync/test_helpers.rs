// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for sync module tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use rp_core::protocol::{ClientMessage, ServerMessage};
use rp_core::{Action, MemoryPersistence, Operation, ResourceType};
use serde_json::{json, Value};
use tokio::sync::{Notify, Semaphore};

use super::remote::{RemoteDataService, RemoteError, RemoteFuture, RemoteResult};
use super::store::QueueStore;
use super::transport::{Transport, TransportError, TransportFuture};

pub const TEST_KEY: &str = "sync_queue:test";

/// Create a pending insert for `workouts` with the given id and timestamp.
pub fn make_op(id: &str, created_at: u64) -> Operation {
    Operation::new(
        id,
        ResourceType::insert("workouts").unwrap(),
        json!({ "name": format!("workout {id}") }),
        created_at,
    )
}

/// Create a pending operation with an explicit action.
pub fn make_op_with(id: &str, action: Action, payload: Value, created_at: u64) -> Operation {
    Operation::new(
        id,
        ResourceType::new("workouts", action).unwrap(),
        payload,
        created_at,
    )
}

/// Open an empty store over shared in-memory persistence.
pub fn memory_store() -> (QueueStore, MemoryPersistence) {
    let persistence = MemoryPersistence::new();
    let store = QueueStore::open(Box::new(persistence.clone()), TEST_KEY).unwrap();
    (store, persistence)
}

/// Ids in queue order.
pub fn ids(ops: &[Operation]) -> Vec<String> {
    ops.iter().map(|op| op.id.clone()).collect()
}

type Responder = dyn Fn(&ClientMessage) -> Option<ServerMessage> + Send + Sync;

/// Mock transport for testing without real sockets.
///
/// Each sent message is recorded and passed to a responder whose reply (if
/// any) is queued for `recv`. Extra messages can be queued up front.
pub struct MockTransport {
    connected: bool,
    connect_should_fail: bool,
    incoming: Arc<Mutex<VecDeque<ServerMessage>>>,
    outgoing: Arc<Mutex<Vec<ClientMessage>>>,
    connects: Arc<Mutex<usize>>,
    responder: Arc<Responder>,
}

impl MockTransport {
    /// A transport whose server answers every request successfully.
    pub fn accepting() -> Self {
        Self::with_responder(|msg| {
            Some(match msg {
                ClientMessage::Insert {
                    request_id, key, ..
                } => ServerMessage::inserted(*request_id, format!("remote-{key}")),
                ClientMessage::Update { request_id, .. }
                | ClientMessage::Delete { request_id, .. } => ServerMessage::ack(*request_id),
                ClientMessage::Ping { id } => ServerMessage::pong(*id),
            })
        })
    }

    pub fn with_responder(
        responder: impl Fn(&ClientMessage) -> Option<ServerMessage> + Send + Sync + 'static,
    ) -> Self {
        MockTransport {
            connected: false,
            connect_should_fail: false,
            incoming: Arc::new(Mutex::new(VecDeque::new())),
            outgoing: Arc::new(Mutex::new(Vec::new())),
            connects: Arc::new(Mutex::new(0)),
            responder: Arc::new(responder),
        }
    }

    /// Add a message that will be returned by recv() before any reply.
    pub fn queue_incoming(&self, msg: ServerMessage) {
        self.incoming.lock().unwrap().push_back(msg);
    }

    pub fn set_connect_fail(&mut self, fail: bool) {
        self.connect_should_fail = fail;
    }

    /// Handle to the sent messages, usable after the transport is moved.
    pub fn outgoing(&self) -> Arc<Mutex<Vec<ClientMessage>>> {
        Arc::clone(&self.outgoing)
    }

    /// Handle to the number of successful connects.
    pub fn connects(&self) -> Arc<Mutex<usize>> {
        Arc::clone(&self.connects)
    }
}

impl Transport for MockTransport {
    fn connect(&mut self, url: &str) -> TransportFuture<'_, ()> {
        let url = url.to_string();
        Box::pin(async move {
            if self.connect_should_fail {
                return Err(TransportError::ConnectionFailed {
                    url,
                    reason: "mock failure".into(),
                });
            }
            self.connected = true;
            *self.connects.lock().unwrap() += 1;
            Ok(())
        })
    }

    fn disconnect(&mut self) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            self.connected = false;
            Ok(())
        })
    }

    fn send(&mut self, msg: ClientMessage) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            if !self.connected {
                return Err(TransportError::NotConnected);
            }
            if let Some(reply) = (self.responder)(&msg) {
                self.incoming.lock().unwrap().push_back(reply);
            }
            self.outgoing.lock().unwrap().push(msg);
            Ok(())
        })
    }

    fn recv(&mut self) -> TransportFuture<'_, Option<ServerMessage>> {
        Box::pin(async move {
            if !self.connected {
                return Err(TransportError::NotConnected);
            }
            // An empty inbox is a peer hang-up; the caller must disconnect
            Ok(self.incoming.lock().unwrap().pop_front())
        })
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

/// A remote call recorded by [`FakeRemote`].
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub action: Action,
    pub resource: String,
    pub id: String,
}

/// In-process [`RemoteDataService`] with scripted failures.
///
/// When paused, every call blocks until [`FakeRemote::release`] grants it.
#[derive(Default)]
pub struct FakeRemote {
    calls: Mutex<Vec<Call>>,
    failures: Mutex<HashMap<String, RemoteError>>,
    offline: AtomicBool,
    gate: Mutex<Option<Arc<Semaphore>>>,
    entered: Notify,
}

impl FakeRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(FakeRemote::default())
    }

    /// Every call for `id` fails with `err` until cleared.
    pub fn fail(&self, id: &str, err: RemoteError) {
        self.failures.lock().unwrap().insert(id.to_string(), err);
    }

    pub fn clear_failure(&self, id: &str) {
        self.failures.lock().unwrap().remove(id);
    }

    /// Makes probes fail.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn pause(&self) {
        *self.gate.lock().unwrap() = Some(Arc::new(Semaphore::new(0)));
    }

    /// Lets `n` blocked (or future) calls proceed.
    pub fn release(&self, n: usize) {
        if let Some(gate) = self.gate.lock().unwrap().as_ref() {
            gate.add_permits(n);
        }
    }

    /// Waits until a call has entered the remote.
    pub async fn wait_entered(&self) {
        self.entered.notified().await;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_ids(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.id).collect()
    }

    async fn record(&self, action: Action, resource: String, id: String) -> RemoteResult<()> {
        self.calls.lock().unwrap().push(Call {
            action,
            resource,
            id: id.clone(),
        });
        self.entered.notify_one();

        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.acquire().await.unwrap().forget();
        }

        match self.failures.lock().unwrap().get(&id) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

impl RemoteDataService for FakeRemote {
    fn insert(&self, resource: String, key: String, _payload: Value) -> RemoteFuture<'_, String> {
        Box::pin(async move {
            self.record(Action::Insert, resource, key.clone()).await?;
            Ok(format!("remote-{key}"))
        })
    }

    fn update(&self, resource: String, id: String, _payload: Value) -> RemoteFuture<'_, ()> {
        Box::pin(self.record(Action::Update, resource, id))
    }

    fn delete(&self, resource: String, id: String) -> RemoteFuture<'_, ()> {
        Box::pin(self.record(Action::Delete, resource, id))
    }

    fn probe(&self) -> RemoteFuture<'_, ()> {
        Box::pin(async move {
            if self.offline.load(Ordering::SeqCst) {
                Err(RemoteError::Transient("unreachable".into()))
            } else {
                Ok(())
            }
        })
    }
}
