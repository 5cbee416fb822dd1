// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration management.
//!
//! Configuration is read from a TOML file with three optional sections:
//! - `[store]`: where the SQLite database lives
//! - `[remote]`: the REST endpoint and how to find its API key
//! - `[sync]`: retry ceiling and background trigger intervals
//!
//! A missing file yields defaults. Relative paths inside the file are
//! resolved against the file's directory.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use outbox_core::DEFAULT_MAX_RETRIES;
use serde::{Deserialize, Serialize};

use crate::env;
use crate::error::{Error, Result};
use crate::sync::SyncConfig;

const APP_DIR_NAME: &str = "outbox";
const CONFIG_FILE_NAME: &str = "config.toml";
const DB_FILE_NAME: &str = "outbox.db";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub sync: SyncSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// SQLite file holding both the queue and the drafts.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Base URL of the REST API (e.g. `https://project.example/rest/v1`).
    pub url: Option<String>,
    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Per-request timeout in milliseconds (default: 10000).
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Attempts before a queued mutation is abandoned (default: 5).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Periodic replay interval in milliseconds (default: 30000).
    #[serde(default = "default_check_interval_ms")]
    pub check_interval_ms: u64,
    /// Connectivity probe interval in milliseconds (default: 15000).
    #[serde(default = "default_probe_interval_ms")]
    pub probe_interval_ms: u64,
}

fn default_api_key_env() -> String {
    env::vars::OUTBOX_API_KEY.to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_check_interval_ms() -> u64 {
    30_000
}

fn default_probe_interval_ms() -> u64 {
    15_000
}

impl Default for RemoteConfig {
    fn default() -> Self {
        RemoteConfig {
            url: None,
            api_key_env: default_api_key_env(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        SyncSettings {
            max_retries: default_max_retries(),
            check_interval_ms: default_check_interval_ms(),
            probe_interval_ms: default_probe_interval_ms(),
        }
    }
}

impl Config {
    /// Load configuration from `path`, falling back to defaults when the file
    /// does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {}", path.display(), e)))?;
        let mut config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse {}: {}", path.display(), e)))?;

        if let (Some(store), Some(dir)) = (&config.store.path, path.parent()) {
            if store.is_relative() {
                config.store.path = Some(dir.join(store));
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the engine spin or never retry.
    pub fn validate(&self) -> Result<()> {
        if self.sync.max_retries == 0 {
            return Err(Error::Config("sync.max_retries must be at least 1".into()));
        }
        if self.sync.check_interval_ms == 0 {
            return Err(Error::Config(
                "sync.check_interval_ms must be greater than 0".into(),
            ));
        }
        if self.sync.probe_interval_ms == 0 {
            return Err(Error::Config(
                "sync.probe_interval_ms must be greater than 0".into(),
            ));
        }
        if self.remote.timeout_ms == 0 {
            return Err(Error::Config(
                "remote.timeout_ms must be greater than 0".into(),
            ));
        }
        if let Some(url) = &self.remote.url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(Error::Config(format!(
                    "remote.url must start with http:// or https://, got '{url}'"
                )));
            }
        }
        Ok(())
    }

    /// Database path: `--db` override, then `[store] path`, then the
    /// platform data directory.
    pub fn db_path(&self, override_path: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = override_path {
            return Ok(path.to_path_buf());
        }
        if let Some(path) = &self.store.path {
            return Ok(path.clone());
        }
        dirs::data_local_dir()
            .map(|dir| dir.join(APP_DIR_NAME).join(DB_FILE_NAME))
            .ok_or_else(|| {
                Error::Config("no data directory found\n  hint: pass --db or set [store] path".into())
            })
    }

    /// The API key from the configured environment variable, if set.
    pub fn api_key(&self) -> Option<String> {
        env::secret(&self.remote.api_key_env)
    }

    pub fn remote_url(&self) -> Option<&str> {
        self.remote.url.as_deref()
    }

    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            max_retries: self.sync.max_retries,
            apply_timeout: Duration::from_millis(self.remote.timeout_ms),
        }
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_millis(self.sync.check_interval_ms)
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_millis(self.sync.probe_interval_ms)
    }
}

/// Config file location: `--config` flag, then `OUTBOX_CONFIG`, then the
/// platform config directory.
pub fn resolve_config_path(flag: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = flag {
        return Some(path.to_path_buf());
    }
    if let Some(path) = env::config_path() {
        return Some(path);
    }
    dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
