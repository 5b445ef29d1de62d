//! Application configuration
//!
//! Layered: built-in defaults, then the JSON config file
//! (`~/.nessie-wallet/config.json` unless a path is given), then explicit
//! overrides from the command line and environment.

use crate::types::{FetchError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Nessie sandbox endpoint
pub const DEFAULT_BASE_URL: &str = "http://api.nessieisreal.com";

/// HTTP request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Which backing source the aggregator reads from
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum DataSourceMode {
    /// Static fixtures, no network access
    #[default]
    Mock,
    /// Remote Nessie API
    Live,
}

impl fmt::Display for DataSourceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSourceMode::Mock => write!(f, "mock"),
            DataSourceMode::Live => write!(f, "live"),
        }
    }
}

#[derive(Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub mode: DataSourceMode,
    pub api_key: Option<String>,
    pub base_url: String,
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            mode: DataSourceMode::default(),
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

// Keeps the API key out of logs
impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("mode", &self.mode)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("base_url", &self.base_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

/// Values supplied on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub mode: Option<DataSourceMode>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

impl AppConfig {
    /// Get the default config path (~/.nessie-wallet/config.json)
    pub fn default_path() -> Result<PathBuf> {
        let home = directories::UserDirs::new()
            .ok_or_else(|| FetchError::Config("Failed to get home directory".into()))?
            .home_dir()
            .to_path_buf();
        Ok(home.join(".nessie-wallet").join("config.json"))
    }

    /// Load configuration.
    ///
    /// An explicit `path` must exist. The default path is optional: when it
    /// is missing (or there is no home directory) the defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => match Self::default_path() {
                Ok(p) if p.exists() => Self::from_file(&p),
                _ => Ok(Self::default()),
            },
        }
    }

    /// Read a JSON config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            FetchError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            FetchError::Config(format!("Invalid config format in {}: {}", path.display(), e))
        })
    }

    /// Apply overrides; empty strings count as unset
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(mode) = overrides.mode {
            self.mode = mode;
        }
        if let Some(key) = overrides.api_key.filter(|k| !k.trim().is_empty()) {
            self.api_key = Some(key);
        }
        if let Some(url) = overrides.base_url.filter(|u| !u.trim().is_empty()) {
            self.base_url = url;
        }
        self
    }

    /// Check the settings the active mode depends on
    pub fn validate(&self) -> Result<()> {
        if self.mode == DataSourceMode::Mock {
            return Ok(());
        }
        if self.api_key().is_none() {
            return Err(FetchError::Config("live mode requires an API key".into()));
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(FetchError::Config(format!(
                "base URL must be http(s): {}",
                self.base_url
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(FetchError::Config("request timeout must be positive".into()));
        }
        Ok(())
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }
}
