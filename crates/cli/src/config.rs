// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! User configuration.
//!
//! Configuration is read from a TOML file located by, in order:
//! - the `--config` flag
//! - `REPSYNC_CONFIG`
//! - `<config dir>/repsync/config.toml`
//!
//! A missing file at the default location means "all defaults". An
//! explicitly named file must exist.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rp_core::{FilePersistence, PersistencePort, SqlitePersistence};
use serde::{Deserialize, Serialize};

use crate::env;
use crate::error::{Error, Result};
use crate::sync::{ConnectivityConfig, SchedulerConfig, SyncInterval, SyncSettings};

const APP_DIR_NAME: &str = "repsync";
const CONFIG_FILE_NAME: &str = "config.toml";
const SQLITE_FILE_NAME: &str = "queue.db";

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Whose queue this is. Each user gets an isolated queue.
    pub user_id: String,
    /// Where queues are stored (default: `<data dir>/repsync`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    pub storage: StorageKind,
    pub sync: SyncConfig,
    pub remote: RemoteConfig,
}

/// Persistence backend for the queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    /// One JSON file per queue, replaced atomically.
    #[default]
    File,
    /// A key/value table in a SQLite database.
    Sqlite,
}

/// `[sync]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    /// 30, 60, 300, or -1 for manual.
    pub interval_secs: SyncInterval,
    pub max_retries: u32,
    pub request_timeout_ms: u64,
    /// Requeue transient failures when connectivity comes back.
    pub auto_retry_transient: bool,
}

/// `[remote]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RemoteConfig {
    /// WebSocket URL of the remote data service.
    pub url: String,
    pub connect_timeout_ms: u64,
    /// Probe cadence while online.
    pub probe_interval_ms: u64,
    /// Cap on the reconnect backoff while offline.
    pub max_delay_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            user_id: "local".to_string(),
            data_dir: None,
            storage: StorageKind::default(),
            sync: SyncConfig::default(),
            remote: RemoteConfig::default(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        let settings = SyncSettings::default();
        SyncConfig {
            interval_secs: SyncInterval::default(),
            max_retries: settings.max_retries,
            request_timeout_ms: duration_ms(settings.request_timeout),
            auto_retry_transient: true,
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        RemoteConfig {
            url: "ws://localhost:7890".to_string(),
            connect_timeout_ms: 5000,
            probe_interval_ms: 5000,
            max_delay_secs: 30,
        }
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

impl Config {
    /// Loads configuration, resolving the file location as described above.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit.map(Path::to_path_buf).or_else(env::config_path) {
            Some(path) => Self::load_from(&path),
            None => match default_config_path() {
                Some(path) if path.exists() => Self::load_from(&path),
                _ => Ok(Config::default()),
            },
        }
    }

    /// Loads and validates the file at `path`.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&content).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source: Box::new(source),
        })?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// Checks values serde cannot express.
    pub fn validate(&self) -> Result<()> {
        let user_ok = !self.user_id.is_empty()
            && self
                .user_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !user_ok {
            return Err(Error::Config(format!(
                "invalid user_id '{}': use letters, digits, '-', '_' or '.'",
                self.user_id
            )));
        }
        if !(self.remote.url.starts_with("ws://") || self.remote.url.starts_with("wss://")) {
            return Err(Error::Config(format!(
                "invalid remote url '{}': must start with ws:// or wss://",
                self.remote.url
            )));
        }
        if self.sync.request_timeout_ms == 0 {
            return Err(Error::Config("request_timeout_ms must be positive".into()));
        }
        Ok(())
    }

    /// Resolves the storage directory: `REPSYNC_DATA_DIR`, then `data_dir`,
    /// then the platform data directory.
    pub fn data_dir(&self) -> PathBuf {
        self.resolve_data_dir(env::data_dir())
    }

    fn resolve_data_dir(&self, env_override: Option<PathBuf>) -> PathBuf {
        env_override
            .or_else(|| self.data_dir.clone())
            .or_else(|| dirs::data_dir().map(|d| d.join(APP_DIR_NAME)))
            .unwrap_or_else(|| PathBuf::from(".repsync"))
    }

    /// Opens the configured persistence backend.
    pub fn open_persistence(&self) -> Result<Box<dyn PersistencePort>> {
        self.open_persistence_in(&self.data_dir())
    }

    /// Opens the configured persistence backend rooted at `dir`.
    pub fn open_persistence_in(&self, dir: &Path) -> Result<Box<dyn PersistencePort>> {
        let persistence: Box<dyn PersistencePort> = match self.storage {
            StorageKind::File => Box::new(FilePersistence::open(dir)?),
            StorageKind::Sqlite => Box::new(SqlitePersistence::open(&dir.join(SQLITE_FILE_NAME))?),
        };
        Ok(persistence)
    }

    pub fn sync_settings(&self) -> SyncSettings {
        SyncSettings {
            max_retries: self.sync.max_retries,
            request_timeout: Duration::from_millis(self.sync.request_timeout_ms),
        }
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            interval: self.sync.interval_secs,
            auto_retry_transient: self.sync.auto_retry_transient,
        }
    }

    pub fn connectivity_config(&self) -> ConnectivityConfig {
        ConnectivityConfig {
            probe_interval: Duration::from_millis(self.remote.probe_interval_ms),
            max_delay: Duration::from_secs(self.remote.max_delay_secs),
            probe_timeout: Duration::from_millis(self.remote.connect_timeout_ms),
            ..ConnectivityConfig::default()
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.remote.connect_timeout_ms)
    }
}

/// `<config dir>/repsync/config.toml`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
