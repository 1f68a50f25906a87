//! Application configuration management.
//!
//! This module handles loading and saving the client configuration: backend
//! URL, request timeout, credential storage backend and the last username.
//!
//! Configuration is stored at `~/.config/promptdex/config.json`. The
//! `PROMPTDEX_API_URL` and `PROMPTDEX_STORAGE` environment variables override
//! the file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::app::AppKind;
use crate::storage::{CredentialStorage, StorageBackend};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "promptdex";

/// Config file name
const CONFIG_FILE: &str = "config.json";

const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";

/// HTTP request timeout in seconds.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

pub const API_URL_ENV: &str = "PROMPTDEX_API_URL";
pub const STORAGE_ENV: &str = "PROMPTDEX_STORAGE";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub api_base_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub storage: StorageBackend,
    pub last_username: Option<String>,
}

impl Config {
    /// Load from the default location and apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_env()?;
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {:?}", path))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {:?}", path))
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

    fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(std::env::var(API_URL_ENV).ok(), std::env::var(STORAGE_ENV).ok())
    }

    /// Apply overrides; empty values are ignored.
    pub fn apply_overrides(&mut self, api_url: Option<String>, storage: Option<String>) -> Result<()> {
        if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
            self.api_base_url = Some(url.trim().to_string());
        }
        if let Some(storage) = storage.filter(|s| !s.trim().is_empty()) {
            self.storage = storage
                .parse()
                .with_context(|| format!("Invalid {} value", STORAGE_ENV))?;
        }
        Ok(())
    }

    pub fn api_base_url(&self) -> String {
        self.api_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS))
    }

    /// Per-application directory for file-backed credential storage
    pub fn storage_dir(&self, app: AppKind) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME).join(app.dir_name()))
    }

    pub fn open_storage(&self, app: AppKind) -> Result<Box<dyn CredentialStorage>> {
        let dir = match self.storage {
            StorageBackend::File => self.storage_dir(app)?,
            StorageBackend::Keyring | StorageBackend::Memory => PathBuf::new(),
        };
        self.storage.open(&dir)
    }
}
