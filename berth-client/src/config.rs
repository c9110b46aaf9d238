//! Client configuration loading
//!
//! Reads `config.toml` from the berth config directory. Every key has a
//! default, so a missing file or section is never an error.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use berth_utils::{config_file, BerthError, Result};

use crate::input::DEFAULT_DETACH_KEY;
use crate::session::DEFAULT_HISTORY_CAPACITY;

const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8000";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub shell: ShellConfig,
    pub files: FilesConfig,
}

/// Container host connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL; WebSocket endpoints are derived from it
    pub url: String,
    /// Per-request timeout for filesystem calls (none by default)
    pub request_timeout_secs: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SERVER_URL.into(),
            request_timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Points kept for the usage chart
    pub history: usize,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            history: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    pub detach_key: String,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            detach_key: DEFAULT_DETACH_KEY.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilesConfig {
    /// Prompt before deleting
    pub confirm_deletes: bool,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            confirm_deletes: true,
        }
    }
}

impl ClientConfig {
    /// Load from the default location
    ///
    /// Returns defaults if the file doesn't exist or can't be parsed.
    pub fn load() -> Self {
        let path = config_file();
        if !path.exists() {
            tracing::debug!("Config file not found, using defaults");
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => {
                tracing::debug!(
                    path = %path.display(),
                    server = %config.server.url,
                    "Loaded config"
                );
                config
            }
            Err(e) => {
                tracing::warn!("{}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Load from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| BerthError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| BerthError::ConfigInvalid {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Parsed server base URL
    pub fn server_url(&self) -> Result<Url> {
        let url = Url::parse(self.server.url.trim())
            .map_err(|e| {
                BerthError::config(format!("invalid server url '{}': {}", self.server.url, e))
            })?;
        match url.scheme() {
            "http" | "https" | "ws" | "wss" => Ok(url),
            other => Err(BerthError::config(format!(
                "unsupported scheme '{}' in server url",
                other
            ))),
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.server
            .request_timeout_secs
            .filter(|&secs| secs > 0)
            .map(Duration::from_secs)
    }

    /// Base URL for HTTP calls (`ws` schemes map back to `http`)
    pub fn http_url(&self) -> Result<Url> {
        let mut url = self.server_url()?;
        let scheme = match url.scheme() {
            "ws" => "http",
            "wss" => "https",
            _ => return Ok(url),
        };
        url.set_scheme(scheme)
            .map_err(|_| BerthError::config("cannot derive http url from server url"))?;
        Ok(url)
    }
}
