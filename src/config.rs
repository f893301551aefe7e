/// Service configuration
///
/// Connection settings for the platform backend that issues image access
/// URLs. Loaded from JSON, either a string or the per-user config file.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default per-request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Errors while loading or parsing the configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Settings for [`HttpImageService`](crate::service::http::HttpImageService)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageServiceConfig {
    /// Base URL of the platform backend (e.g. "https://api.listspace.ph")
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Optional bearer token sent with every request
    #[serde(default)]
    pub auth_token: Option<String>,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl ImageServiceConfig {
    /// Parse from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to a JSON string
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load from the per-user config file.
    ///
    /// The file is expected at:
    /// - Linux: ~/.config/listspace/images.json
    /// - macOS: ~/Library/Application Support/listspace/images.json
    /// - Windows: %APPDATA%\listspace\images.json
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if !path.exists() {
            return Err(ConfigError::NotFound(path));
        }
        let json = std::fs::read_to_string(&path)?;
        Self::from_json(&json)
    }

    /// Path where the config file is expected
    pub fn default_path() -> PathBuf {
        let mut path = dirs::config_dir()
            .or_else(|| dirs::home_dir())
            .expect("Could not determine user config directory");

        path.push("listspace");
        path.push("images.json");
        path
    }
}
