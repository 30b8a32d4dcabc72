//! Client configuration management.
//!
//! This module handles loading and saving the client configuration: the
//! backend URL, request timing, where the session is persisted, and the last
//! email used to log in.
//!
//! Configuration is stored at `~/.config/agente-mawdsleys/config.json`.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::storage::{FileStorage, KeyringStorage, SessionStorage};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "agente-mawdsleys";

/// Config file name
const CONFIG_FILE: &str = "config.json";

const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";

/// HTTP request timeout in seconds, matching the web dashboard.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;

/// Maximum number of retries for rate-limited (429) requests.
const DEFAULT_MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const DEFAULT_INITIAL_BACKOFF_MS: u64 = 1000;

/// Where the persisted session record lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// `session.json` in the cache directory
    #[default]
    File,
    /// OS keychain
    Keyring,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub max_rate_limit_retries: u32,
    pub initial_backoff_ms: u64,
    pub storage: StorageBackend,
    pub last_email: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            max_rate_limit_retries: DEFAULT_MAX_RATE_LIMIT_RETRIES,
            initial_backoff_ms: DEFAULT_INITIAL_BACKOFF_MS,
            storage: StorageBackend::default(),
            last_email: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Open the configured session storage backend
    pub fn open_storage(&self) -> Result<Arc<dyn SessionStorage>> {
        Ok(match self.storage {
            StorageBackend::File => Arc::new(FileStorage::new(self.cache_dir()?)),
            StorageBackend::Keyring => Arc::new(KeyringStorage::new()),
        })
    }
}
