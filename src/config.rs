//! Client configuration.
//!
//! Values are layered: built-in defaults, then an optional JSON file, then
//! environment variables.
//!
//! | Variable | Field |
//! |----------|-------|
//! | `CHATLINE_CONFIG` | path of the JSON file |
//! | `CHATLINE_BASE_URL` | `base_url` |
//! | `CHATLINE_MODEL` | `default_model` |
//! | `CHATLINE_TIMEOUT_SECS` | `request_timeout_secs` |
//! | `CHATLINE_LOG` | `log_filter` |

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::state::DEFAULT_MODEL;

pub const ENV_CONFIG_PATH: &str = "CHATLINE_CONFIG";
pub const ENV_BASE_URL: &str = "CHATLINE_BASE_URL";
pub const ENV_MODEL: &str = "CHATLINE_MODEL";
pub const ENV_TIMEOUT_SECS: &str = "CHATLINE_TIMEOUT_SECS";
pub const ENV_LOG: &str = "CHATLINE_LOG";

const DEFAULT_BASE_URL: &str = "http://localhost:3000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_LOG_FILTER: &str = "chatline=info";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {message}")]
    Read { path: PathBuf, message: String },

    #[error("malformed config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("base url must start with http:// or https://, got '{0}'")]
    InvalidBaseUrl(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Chat server root, without trailing slash
    pub base_url: String,
    /// Model selected at startup
    pub default_model: String,
    pub request_timeout_secs: u64,
    /// `tracing` filter used when `RUST_LOG` is unset
    pub log_filter: String,
}

/// On-disk shape; every field optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    base_url: Option<String>,
    default_model: Option<String>,
    request_timeout_secs: Option<u64>,
    log_filter: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    pub fn with_request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = filter.into();
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Defaults, overlaid by the config file (if any), overlaid by the
    /// process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let explicit = std::env::var_os(ENV_CONFIG_PATH).map(PathBuf::from);
        let config = match explicit {
            Some(path) => Self::default().merge_file(&path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::default().merge_file(&path)?,
                _ => Self::default(),
            },
        };
        config
            .merge_env(|key| std::env::var(key).ok())
            .validated()
    }

    /// `<config_dir>/chatline/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("chatline").join("config.json"))
    }

    /// Overlay the fields present in the JSON file at `path`.
    pub fn merge_file(self, path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let file: FileConfig = serde_json::from_str(&raw).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        tracing::debug!(path = %path.display(), "Loaded config file");

        let mut config = self;
        if let Some(url) = file.base_url {
            config = config.with_base_url(url);
        }
        if let Some(model) = file.default_model {
            config.default_model = model;
        }
        if let Some(secs) = file.request_timeout_secs {
            config.request_timeout_secs = secs;
        }
        if let Some(filter) = file.log_filter {
            config.log_filter = filter;
        }
        Ok(config)
    }

    /// Overlay values from `lookup`. Unusable timeouts are ignored.
    pub fn merge_env(self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = self;
        if let Some(url) = lookup(ENV_BASE_URL).filter(|v| !v.trim().is_empty()) {
            config = config.with_base_url(url.trim());
        }
        if let Some(model) = lookup(ENV_MODEL).filter(|v| !v.trim().is_empty()) {
            config.default_model = model.trim().to_string();
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.request_timeout_secs = secs,
                _ => tracing::warn!(value = %raw, "Ignoring invalid {}", ENV_TIMEOUT_SECS),
            }
        }
        if let Some(filter) = lookup(ENV_LOG).filter(|v| !v.trim().is_empty()) {
            config.log_filter = filter;
        }
        config
    }

    pub fn validated(self) -> Result<Self, ConfigError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidBaseUrl(self.base_url));
        }
        Ok(self)
    }
}
