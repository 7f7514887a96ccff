// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Pluggable key/value persistence for the offline queue.
//!
//! The queue store only needs to read and replace a single value per
//! session key, so backends implement a small raw-bytes interface:
//!
//! - [`FilePersistence`] - one file per key, written via temp file + fsync + rename
//! - [`SqlitePersistence`] - a key/value table in a SQLite database
//! - [`MemoryPersistence`] - in-process map for tests, with injectable write failures
//!
//! Every `set` must be durable when it returns.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use fs2::FileExt;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{Error, Result};

/// Raw key/value storage used by the queue store.
pub trait PersistencePort: Send {
    /// Returns the stored bytes for `key`, or `None` if nothing is stored.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Durably replaces the value stored at `key`.
    fn set(&mut self, key: &str, value: &[u8]) -> Result<()>;

    /// Removes `key`. Removing a missing key is not an error.
    fn remove(&mut self, key: &str) -> Result<()>;
}

impl<P: PersistencePort + ?Sized> PersistencePort for Box<P> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

const LOCK_FILE_NAME: &str = ".lock";

/// Stores each key as a JSON file inside a directory.
///
/// The directory is locked for the lifetime of the value so that two
/// processes never write the same queue.
pub struct FilePersistence {
    dir: PathBuf,
    /// Held for its advisory lock.
    _lock: File,
}

impl FilePersistence {
    /// Opens (and creates if needed) a persistence directory.
    pub fn open(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;

        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(dir.join(LOCK_FILE_NAME))?;
        lock.try_lock_exclusive().map_err(|_| {
            Error::Storage(format!(
                "{} is in use by another process\n  hint: stop the running 'repsync watch' first",
                dir.display()
            ))
        })?;

        Ok(FilePersistence {
            dir: dir.to_path_buf(),
            _lock: lock,
        })
    }

    /// Returns the file a key is stored in.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(file_name_for_key(key))
    }
}

/// Maps a key such as `sync_queue:alice` to a portable file name.
fn file_name_for_key(key: &str) -> String {
    let mut name: String = key
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();
    name.push_str(".json");
    name
}

impl PersistencePort for FilePersistence {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<()> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");

        let write = || -> std::io::Result<()> {
            let mut file = File::create(&tmp)?;
            file.write_all(value)?;
            file.sync_all()?;
            fs::rename(&tmp, &path)
        };

        write().map_err(|e| {
            let _ = fs::remove_file(&tmp);
            Error::Storage(format!("failed to write {}: {e}", path.display()))
        })
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Storage(format!("failed to remove {key}: {e}"))),
        }
    }
}

/// SQL schema for the key/value table.
const KV_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS kv (
    key TEXT PRIMARY KEY,
    value BLOB NOT NULL
);
"#;

/// Stores keys in a single SQLite table.
pub struct SqlitePersistence {
    conn: Connection,
}

impl SqlitePersistence {
    /// Opens or creates the database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = FULL;
             PRAGMA busy_timeout = 5000;",
        )?;
        conn.execute_batch(KV_SCHEMA)?;
        Ok(SqlitePersistence { conn })
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(KV_SCHEMA)?;
        Ok(SqlitePersistence { conn })
    }
}

impl PersistencePort for SqlitePersistence {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| {
                row.get::<_, Vec<u8>>(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO kv (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )
            .map_err(|e| Error::Storage(format!("failed to write {key}: {e}")))?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", [key])
            .map_err(|e| Error::Storage(format!("failed to remove {key}: {e}")))?;
        Ok(())
    }
}

/// In-memory persistence for tests.
///
/// Clones share the same map, so a test can keep a handle to inspect or
/// corrupt what the store wrote.
#[derive(Clone, Default)]
pub struct MemoryPersistence {
    values: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `set`/`remove` fail with a storage error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Stores raw bytes directly, bypassing the failure switch.
    pub fn insert_raw(&self, key: &str, value: impl Into<Vec<u8>>) {
        self.lock().insert(key.to_string(), value.into());
    }

    /// Returns the raw bytes stored at `key`.
    pub fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.lock().get(key).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>> {
        self.values.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_writable(&self, key: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Storage(format!("write to {key} rejected")));
        }
        Ok(())
    }
}

impl PersistencePort for MemoryPersistence {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.raw(key))
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<()> {
        self.check_writable(key)?;
        self.lock().insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.check_writable(key)?;
        self.lock().remove(key);
        Ok(())
    }
}

#[cfg(test)]
#[path = "persist_tests.rs"]
mod tests;
