//! Application configuration
//!
//! JSON file with every field optional, followed by `BASKET_*` environment
//! overrides.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::store::Policy;

pub const DEFAULT_STORAGE_PREFIX: &str = "shoppingListAppState";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub max_free_lists: usize,
    pub max_free_categories: usize,
}

impl Default for Limits {
    fn default() -> Self {
        let policy = Policy::default();
        Self {
            max_free_lists: policy.max_free_lists,
            max_free_categories: policy.max_free_categories,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub storage_prefix: String,
    pub db_path: PathBuf,
    pub log_dir: PathBuf,
    pub api_base_url: String,
    pub suggestion_url: Option<String>,
    pub request_timeout_ms: u64,
    pub geolocation_timeout_ms: u64,
    pub limits: Limits,
    pub premium_edits_global_categories: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage_prefix: DEFAULT_STORAGE_PREFIX.to_string(),
            db_path: PathBuf::from("basket.db"),
            log_dir: PathBuf::from("logs"),
            api_base_url: "http://localhost/api/".to_string(),
            suggestion_url: None,
            request_timeout_ms: 10_000,
            geolocation_timeout_ms: 8_000,
            limits: Limits::default(),
            premium_edits_global_categories: true,
        }
    }
}

impl AppConfig {
    /// Read `path` (a missing file yields defaults) and apply the process
    /// environment on top.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::from_file(path)?;
        Ok(config.with_overrides(|key| std::env::var(key).ok()))
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply `BASKET_*` overrides looked up through `lookup`. Blank values
    /// are ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get("BASKET_API_URL") {
            self.api_base_url = url;
        }
        if let Some(path) = get("BASKET_DB_PATH") {
            self.db_path = PathBuf::from(path);
        }
        if let Some(dir) = get("BASKET_LOG_DIR") {
            self.log_dir = PathBuf::from(dir);
        }
        if let Some(prefix) = get("BASKET_STORAGE_PREFIX") {
            self.storage_prefix = prefix;
        }
        self
    }

    pub fn policy(&self) -> Policy {
        Policy {
            max_free_lists: self.limits.max_free_lists,
            max_free_categories: self.limits.max_free_categories,
            premium_edits_global_categories: self.premium_edits_global_categories,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn geolocation_timeout(&self) -> Duration {
        Duration::from_millis(self.geolocation_timeout_ms)
    }
}
