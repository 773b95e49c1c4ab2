// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Client configuration.
//!
//! Configuration is read from `turnstile.toml`, located (in order) by the
//! `--config` flag, `TURNSTILE_CONFIG`, or `<state_dir>/config.toml`. A
//! missing file means all defaults. Every field has a default, so a config
//! only needs to list what it changes:
//!
//! ```toml
//! endpoint = "wss://live.example.com/socket"
//! stuck_threshold = 5
//!
//! [query]
//! org = "acme"
//!
//! [backoff]
//! base_ms = 1000
//! cap_ms = 30000
//! max_attempts = 10
//! jitter_ms = 1000
//!
//! [storage]
//! backend = "sqlite"
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::env;
use crate::sync::{
    BackoffPolicy, FileStore, HeartbeatPolicy, KeyValueStore, SessionConfig, SqliteStore,
    StoreResult,
};

const CONFIG_FILE_NAME: &str = "config.toml";
const QUEUE_DIR_NAME: &str = "queue";
const QUEUE_DB_NAME: &str = "queue.db";

/// Errors loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid endpoint '{0}'\n  hint: endpoints must start with ws:// or wss://")]
    InvalidEndpoint(String),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Contents of `turnstile.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// WebSocket URL of the relay.
    pub endpoint: String,
    /// Failed deliveries after which a queued action is reported stuck (0 = never).
    pub stuck_threshold: u32,
    /// Extra parameters sent with the `hello` handshake.
    pub query: BTreeMap<String, String>,
    pub backoff: BackoffConfig,
    pub heartbeat: HeartbeatConfig,
    pub timeouts: TimeoutConfig,
    pub storage: StorageConfig,
}

/// `[backoff]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffConfig {
    pub base_ms: u64,
    pub cap_ms: u64,
    /// Attempts before giving up (0 = unlimited).
    pub max_attempts: u32,
    pub jitter_ms: u64,
}

/// `[heartbeat]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeartbeatConfig {
    /// Ping interval (0 = disabled).
    pub interval_ms: u64,
    pub max_missed: u32,
}

/// `[timeouts]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub connect_ms: u64,
    pub ack_ms: u64,
}

/// Where the offline queue is persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// One JSON file per stream.
    #[default]
    File,
    /// A single SQLite database.
    Sqlite,
}

/// `[storage]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Overrides the location under the state directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

fn default_endpoint() -> String {
    "ws://127.0.0.1:7890".to_string()
}

fn default_stuck_threshold() -> u32 {
    5
}

impl Default for Config {
    fn default() -> Self {
        Config {
            endpoint: default_endpoint(),
            stuck_threshold: default_stuck_threshold(),
            query: BTreeMap::new(),
            backoff: BackoffConfig::default(),
            heartbeat: HeartbeatConfig::default(),
            timeouts: TimeoutConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl Default for BackoffConfig {
    fn default() -> Self {
        BackoffConfig {
            base_ms: 1_000,
            cap_ms: 30_000,
            max_attempts: 10,
            jitter_ms: 1_000,
        }
    }
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        HeartbeatConfig {
            interval_ms: 25_000,
            max_missed: 2,
        }
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        TimeoutConfig {
            connect_ms: 10_000,
            ack_ms: 10_000,
        }
    }
}

impl Config {
    /// Loads configuration from `path`.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Like [`Config::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> ConfigResult<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(Config::default())
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.endpoint.starts_with("ws://") || self.endpoint.starts_with("wss://") {
            Ok(())
        } else {
            Err(ConfigError::InvalidEndpoint(self.endpoint.clone()))
        }
    }

    /// Renders the effective configuration as TOML.
    pub fn to_toml(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Builds the session settings for one stream.
    pub fn session_config(&self, stream: &str) -> SessionConfig {
        SessionConfig {
            stream: stream.to_string(),
            endpoint: self.endpoint.clone(),
            query: self.query.clone(),
            connect_timeout: Duration::from_millis(self.timeouts.connect_ms),
            ack_timeout: Duration::from_millis(self.timeouts.ack_ms),
            backoff: BackoffPolicy {
                base: Duration::from_millis(self.backoff.base_ms),
                cap: Duration::from_millis(self.backoff.cap_ms),
                max_attempts: self.backoff.max_attempts,
                jitter: Duration::from_millis(self.backoff.jitter_ms),
            },
            heartbeat: HeartbeatPolicy {
                interval: Duration::from_millis(self.heartbeat.interval_ms),
                max_missed: self.heartbeat.max_missed,
            },
            stuck_threshold: self.stuck_threshold,
        }
    }
}

impl StorageConfig {
    /// Resolved location of the store: a directory for `file`, a database
    /// file for `sqlite`.
    pub fn location(&self, state_dir: &Path) -> PathBuf {
        match (&self.path, self.backend) {
            (Some(path), _) => path.clone(),
            (None, StorageBackend::File) => state_dir.join(QUEUE_DIR_NAME),
            (None, StorageBackend::Sqlite) => state_dir.join(QUEUE_DB_NAME),
        }
    }

    /// Opens the configured backend.
    pub fn open(&self, state_dir: &Path) -> StoreResult<Box<dyn KeyValueStore>> {
        let location = self.location(state_dir);
        match self.backend {
            StorageBackend::File => Ok(Box::new(FileStore::open(location)?)),
            StorageBackend::Sqlite => {
                if let Some(parent) = location.parent() {
                    fs::create_dir_all(parent)?;
                }
                Ok(Box::new(SqliteStore::open(location)?))
            }
        }
    }
}

/// Picks the state directory from the explicit override, then
/// `$XDG_STATE_HOME/turnstile`, then `~/.local/state/turnstile`.
pub fn resolve_state_dir(explicit: Option<PathBuf>, xdg_state_home: Option<PathBuf>) -> PathBuf {
    if let Some(dir) = explicit {
        return dir;
    }
    if let Some(dir) = xdg_state_home {
        return dir.join("turnstile");
    }
    dirs::home_dir()
        .map(|h| h.join(".local/state/turnstile"))
        .unwrap_or_else(|| PathBuf::from(".local/state/turnstile"))
}

/// State directory from the environment.
pub fn state_dir() -> PathBuf {
    resolve_state_dir(env::state_dir(), env::xdg_state_home())
}

/// Picks the config file: `--config`, then `TURNSTILE_CONFIG`, then the
/// state directory.
pub fn resolve_config_path(
    flag: Option<PathBuf>,
    from_env: Option<PathBuf>,
    state_dir: &Path,
) -> PathBuf {
    flag.or(from_env)
        .unwrap_or_else(|| state_dir.join(CONFIG_FILE_NAME))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
