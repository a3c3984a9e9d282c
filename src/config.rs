//! Service configuration.
//!
//! Layered the usual way: built-in defaults, then an optional TOML file,
//! then environment overrides. Loading is tolerant: a missing file means
//! defaults, a malformed file is logged and ignored rather than taking the
//! whole service down.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Result, TaskError};

/// Endpoint assumed during development when nothing is configured.
pub const DEV_DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

/// Config file override.
pub const ENV_CONFIG: &str = "TASKRELAY_CONFIG";
/// Data directory override.
pub const ENV_DATA_DIR: &str = "TASKRELAY_DATA_DIR";
/// Backend endpoint override.
pub const ENV_BACKEND_URL: &str = "TASKRELAY_BACKEND_URL";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub backend: BackendConfig,
    pub storage: StorageConfig,
}

/// Remote backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Explicit backend endpoint. Absent means the development default is
    /// assumed but not trusted for optimistic routing.
    pub url: Option<String>,
    /// Seconds between availability probes.
    pub poll_interval_secs: u64,
    /// Per-probe timeout in seconds.
    pub probe_timeout_secs: u64,
    /// Seconds to wait after a remote failure before retrying.
    pub cooldown_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: None,
            poll_interval_secs: 5,
            probe_timeout_secs: 2,
            cooldown_secs: 10,
        }
    }
}

impl BackendConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }
}

/// Local store settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Task file path. Absent means the platform data directory.
    pub path: Option<PathBuf>,
}

impl ServiceConfig {
    /// Load configuration from the default location, tolerantly.
    ///
    /// Resolution order for the file path: `TASKRELAY_CONFIG`, then the
    /// platform config directory. A missing file yields defaults; a file
    /// that fails to parse is logged and ignored.
    pub fn load() -> Self {
        let path = std::env::var_os(ENV_CONFIG)
            .map(PathBuf::from)
            .or_else(Self::default_config_path);

        let Some(path) = path else {
            return Self::default();
        };
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Self::default();
        }

        match Self::from_file(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "config unusable, using defaults");
                Self::default()
            }
        }
    }

    /// Parse configuration from a specific TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| TaskError::Config(format!("read {}: {e}", path.display())))?;
        toml::from_str(&raw)
            .map_err(|e| TaskError::Config(format!("parse {}: {e}", path.display())))
    }

    fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("taskrelay").join("config.toml"))
    }

    /// Resolve the backend base endpoint and whether it was explicitly
    /// configured. `TASKRELAY_BACKEND_URL` wins over the config file; with
    /// neither set the development default applies, flagged non-explicit so
    /// routing stays pessimistic about it.
    pub fn backend_base_url(&self) -> (String, bool) {
        if let Ok(url) = std::env::var(ENV_BACKEND_URL)
            && !url.trim().is_empty()
        {
            return (url, true);
        }
        match &self.backend.url {
            Some(url) if !url.trim().is_empty() => (url.clone(), true),
            _ => (DEV_DEFAULT_BACKEND_URL.to_owned(), false),
        }
    }

    /// Resolve the task file path. `TASKRELAY_DATA_DIR` wins over the config
    /// file; with neither set the platform data directory applies, falling
    /// back to a dotdir under the working directory.
    pub fn storage_path(&self) -> PathBuf {
        if let Some(dir) = std::env::var_os(ENV_DATA_DIR) {
            return PathBuf::from(dir).join("tasks.json");
        }
        if let Some(path) = &self.storage.path {
            return path.clone();
        }
        dirs::data_dir()
            .map(|dir| dir.join("taskrelay").join("tasks.json"))
            .unwrap_or_else(|| PathBuf::from(".taskrelay").join("tasks.json"))
    }
}
