// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Server state management.
//!
//! Wraps the record store for shared access and turns client requests into
//! replies.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, error, info};

use rp_core::protocol::{ClientMessage, ServerMessage};
use rp_core::FailureKind;

use crate::db::{RecordStore, UpdateOutcome};

const DB_FILE_NAME: &str = "records.db";

/// Shared server state containing the record store.
#[derive(Clone)]
pub struct ServerState {
    inner: Arc<ServerStateInner>,
}

struct ServerStateInner {
    db: Mutex<RecordStore>,
    /// Accepted resources; `None` accepts any.
    resources: Option<HashSet<String>>,
}

impl ServerState {
    /// Opens `records.db` in `data_dir`.
    pub fn open(data_dir: &Path, resources: Vec<String>) -> rusqlite::Result<Self> {
        let db = RecordStore::open(&data_dir.join(DB_FILE_NAME))?;
        for resource in &resources {
            info!(resource, records = db.count(resource)?, "serving resource");
        }
        Ok(Self::new(db, resources))
    }

    pub fn new(db: RecordStore, resources: Vec<String>) -> Self {
        let resources = if resources.is_empty() {
            None
        } else {
            Some(resources.into_iter().collect())
        };
        ServerState {
            inner: Arc::new(ServerStateInner {
                db: Mutex::new(db),
                resources,
            }),
        }
    }

    fn allows(&self, resource: &str) -> bool {
        self.inner
            .resources
            .as_ref()
            .map_or(true, |allowed| allowed.contains(resource))
    }

    /// Applies one request and builds its reply.
    pub async fn apply(&self, msg: ClientMessage) -> ServerMessage {
        let request_id = msg.request_id();
        match msg {
            ClientMessage::Ping { id } => ServerMessage::pong(id),

            ClientMessage::Insert {
                resource,
                key,
                payload,
                ..
            } => {
                if !self.allows(&resource) {
                    return unknown_resource(request_id, &resource);
                }
                let db = self.inner.db.lock().await;
                match db.upsert(&resource, &key, &payload) {
                    Ok(id) => {
                        debug!(resource, id, "inserted");
                        ServerMessage::inserted(request_id, id)
                    }
                    Err(e) => storage_failure(request_id, e),
                }
            }

            ClientMessage::Update {
                resource,
                id,
                payload,
                ..
            } => {
                if !self.allows(&resource) {
                    return unknown_resource(request_id, &resource);
                }
                let db = self.inner.db.lock().await;
                match db.update(&resource, &id, &payload) {
                    Ok(UpdateOutcome::Updated) => {
                        debug!(resource, id, "updated");
                        ServerMessage::ack(request_id)
                    }
                    Ok(UpdateOutcome::Missing) => ServerMessage::rejected(
                        request_id,
                        FailureKind::Permanent,
                        format!("no {resource} record {id}"),
                    ),
                    Ok(UpdateOutcome::Deleted) => ServerMessage::rejected(
                        request_id,
                        FailureKind::Permanent,
                        format!("{resource} record {id} was deleted"),
                    ),
                    Err(e) => storage_failure(request_id, e),
                }
            }

            ClientMessage::Delete { resource, id, .. } => {
                if !self.allows(&resource) {
                    return unknown_resource(request_id, &resource);
                }
                let db = self.inner.db.lock().await;
                match db.delete(&resource, &id) {
                    Ok(existed) => {
                        debug!(resource, id, existed, "deleted");
                        ServerMessage::ack(request_id)
                    }
                    Err(e) => storage_failure(request_id, e),
                }
            }
        }
    }

    #[cfg(test)]
    pub(crate) async fn with_db<T>(&self, f: impl FnOnce(&RecordStore) -> T) -> T {
        let db = self.inner.db.lock().await;
        f(&db)
    }
}

fn unknown_resource(request_id: u64, resource: &str) -> ServerMessage {
    ServerMessage::rejected(
        request_id,
        FailureKind::Permanent,
        format!("unknown resource: {resource}"),
    )
}

fn storage_failure(request_id: u64, e: rusqlite::Error) -> ServerMessage {
    error!(error = %e, "database error");
    ServerMessage::rejected(
        request_id,
        FailureKind::Transient,
        format!("database error: {e}"),
    )
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
