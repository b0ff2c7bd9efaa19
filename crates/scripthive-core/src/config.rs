//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which includes the API base URL override, the last email used to sign in
//! and where the session is kept.
//!
//! Configuration is stored at `~/.config/scripthive-admin/config.json`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::DEFAULT_BASE_URL;
use crate::auth::{FileStorage, KeyringStorage, MemoryStorage, Storage};

/// Application name used for config/data directory paths
pub const APP_NAME: &str = "scripthive-admin";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding the API base URL
pub const API_URL_ENV: &str = "SCRIPTHIVE_API_URL";

/// Where the persisted session lives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    #[default]
    File,
    Keyring,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub api_base_url: Option<String>,
    pub last_email: Option<String>,
    #[serde(default)]
    pub session_backend: SessionBackend,

    /// File this config was loaded from and is saved back to.
    #[serde(skip)]
    path: Option<PathBuf>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(Self::config_path()?)
    }

    pub fn load_from(path: PathBuf) -> Result<Self> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("parsing {}", path.display()))?
        } else {
            Self::default()
        };
        config.path = Some(path);
        Ok(config)
    }

    /// Empty config that will be saved to `path`.
    pub fn at(path: PathBuf) -> Self {
        Self {
            path: Some(path),
            ..Self::default()
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = match self.path {
            Some(ref path) => path.clone(),
            None => Self::config_path()?,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, contents).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory for the session file and logs.
    pub fn data_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Base URL from the environment, then the config file, then the default.
    pub fn base_url(&self) -> String {
        resolve_base_url(std::env::var(API_URL_ENV).ok(), self.api_base_url.as_deref())
    }

    /// Open the storage backend the session should be kept in.
    pub fn open_storage(&self, ephemeral: bool) -> Result<Storage> {
        if ephemeral {
            return Ok(Storage::Memory(MemoryStorage::new()));
        }
        match self.session_backend {
            SessionBackend::File => Ok(Storage::File(FileStorage::new(self.data_dir()?))),
            SessionBackend::Keyring => Ok(Storage::Keyring(KeyringStorage::new(APP_NAME))),
        }
    }
}

fn resolve_base_url(env: Option<String>, configured: Option<&str>) -> String {
    let url = env
        .filter(|u| !u.trim().is_empty())
        .or_else(|| configured.filter(|u| !u.trim().is_empty()).map(str::to_string))
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    url.trim().trim_end_matches('/').to_string()
}
