// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! SQLite record storage.
//!
//! One table holds every resource. Deletes are soft so a repeated delete
//! and a late update can both be told apart from "never existed".

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::{params, Connection, OptionalExtension, Result};
use serde_json::Value;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS records (
    resource TEXT NOT NULL,
    id TEXT NOT NULL,
    body TEXT NOT NULL,
    deleted INTEGER NOT NULL DEFAULT 0,
    updated_at INTEGER NOT NULL,
    PRIMARY KEY (resource, id)
);
"#;

/// A stored record.
#[cfg(test)]
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub resource: String,
    pub id: String,
    pub body: Value,
    pub deleted: bool,
    pub updated_at: i64,
}

/// Result of an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated,
    Missing,
    Deleted,
}

pub struct RecordStore {
    conn: Connection,
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

impl RecordStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(RecordStore { conn })
    }

    /// Creates or replaces the record keyed by `key`. Returns the record id,
    /// which is the key itself, so repeated delivery yields the same id.
    pub fn upsert(&self, resource: &str, key: &str, body: &Value) -> Result<String> {
        self.conn.execute(
            "INSERT INTO records (resource, id, body, deleted, updated_at)
             VALUES (?1, ?2, ?3, 0, ?4)
             ON CONFLICT (resource, id) DO UPDATE
             SET body = excluded.body, deleted = 0, updated_at = excluded.updated_at",
            params![resource, key, body.to_string(), now_ms()],
        )?;
        Ok(key.to_string())
    }

    /// Replaces the body of a live record.
    pub fn update(&self, resource: &str, id: &str, body: &Value) -> Result<UpdateOutcome> {
        match self.deleted_flag(resource, id)? {
            None => return Ok(UpdateOutcome::Missing),
            Some(true) => return Ok(UpdateOutcome::Deleted),
            Some(false) => {}
        }
        self.conn.execute(
            "UPDATE records SET body = ?3, updated_at = ?4 WHERE resource = ?1 AND id = ?2",
            params![resource, id, body.to_string(), now_ms()],
        )?;
        Ok(UpdateOutcome::Updated)
    }

    /// Marks a record deleted. Returns false if there was nothing live to delete.
    pub fn delete(&self, resource: &str, id: &str) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE records SET deleted = 1, updated_at = ?3
             WHERE resource = ?1 AND id = ?2 AND deleted = 0",
            params![resource, id, now_ms()],
        )?;
        Ok(changed > 0)
    }

    #[cfg(test)]
    pub fn get(&self, resource: &str, id: &str) -> Result<Option<Record>> {
        self.conn
            .query_row(
                "SELECT resource, id, body, deleted, updated_at FROM records
                 WHERE resource = ?1 AND id = ?2",
                params![resource, id],
                |row| {
                    let body: String = row.get(2)?;
                    Ok(Record {
                        resource: row.get(0)?,
                        id: row.get(1)?,
                        body: serde_json::from_str(&body).unwrap_or(Value::Null),
                        deleted: row.get(3)?,
                        updated_at: row.get(4)?,
                    })
                },
            )
            .optional()
    }

    /// Number of live records in `resource`.
    pub fn count(&self, resource: &str) -> Result<usize> {
        let n: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM records WHERE resource = ?1 AND deleted = 0",
            params![resource],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(n).unwrap_or(0))
    }

    /// Drops the table so later statements fail.
    #[cfg(test)]
    pub(crate) fn break_schema(&self) {
        let _ = self.conn.execute_batch("DROP TABLE records;");
    }

    fn deleted_flag(&self, resource: &str, id: &str) -> Result<Option<bool>> {
        self.conn
            .query_row(
                "SELECT deleted FROM records WHERE resource = ?1 AND id = ?2",
                params![resource, id],
                |row| row.get(0),
            )
            .optional()
    }
}

#[cfg(test)]
#[path = "db_tests.rs"]
mod tests;
