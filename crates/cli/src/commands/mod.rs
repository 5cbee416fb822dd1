// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod draft;
pub mod queue;
pub mod watch;

#[cfg(test)]
#[path = "mod_tests.rs"]
pub mod testing;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use outbox_core::{DraftStore, QueueStore};

use crate::config::{resolve_config_path, Config};
use crate::error::{Error, Result};
use crate::sync::{Gateway, RestGateway, SyncManager};

/// Resolved configuration and store location for one invocation.
pub struct Context {
    pub config: Config,
    pub config_path: Option<PathBuf>,
    pub db_path: PathBuf,
}

impl Context {
    /// Resolve config and database path from the global flags.
    pub fn load(config_flag: Option<&Path>, db_flag: Option<&Path>) -> Result<Self> {
        let config_path = resolve_config_path(config_flag);
        let config = match &config_path {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        let db_path = config.db_path(db_flag)?;
        tracing::debug!(db = %db_path.display(), "resolved database path");

        Ok(Context {
            config,
            config_path,
            db_path,
        })
    }

    pub fn queue(&self) -> Result<QueueStore> {
        Ok(QueueStore::open(&self.db_path)?)
    }

    pub fn drafts(&self) -> Result<DraftStore> {
        Ok(DraftStore::open(&self.db_path)?)
    }

    /// A manager over the on-disk queue with the draft store attached.
    pub fn manager<G: Gateway>(&self, gateway: G) -> Result<SyncManager<QueueStore, G>> {
        let drafts = Arc::new(self.drafts()?);
        Ok(SyncManager::new(self.queue()?, gateway, self.config.sync_config()).with_drafts(drafts))
    }

    /// The configured REST gateway.
    pub fn gateway(&self) -> Result<RestGateway> {
        let url = self
            .config
            .remote_url()
            .ok_or_else(|| Error::RemoteNotConfigured {
                path: self
                    .config_path
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "the config file".to_string()),
            })?;
        Ok(RestGateway::new(url, self.config.api_key())?)
    }
}

/// Timestamp format used in text output.
pub(crate) fn format_time(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S%.3f").to_string()
}
