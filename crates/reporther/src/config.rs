//! # Configuration
//!
//! Settings are resolved in three layers, later layers winning:
//!
//! 1. built-in defaults ([`AppConfig::default`]);
//! 2. an optional JSON file ([`AppConfig::from_file`]), where every field may be omitted;
//! 3. `REPORTHER_*` environment variables ([`AppConfig::apply_env`]).
//!
//! ```rust
//! use reporther::config::AppConfig;
//!
//! let config = AppConfig::from_json(r#"{ "actor_wait_timeout_ms": 2500 }"#).unwrap();
//! assert_eq!(config.wait_options().timeout.as_millis(), 2500);
//! assert_eq!(config.poll_interval_ms, 100);
//! ```

use actor_cache::{WaitOptions, DEFAULT_POLL_INTERVAL, DEFAULT_WAIT_TIMEOUT};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub const ENV_WAIT_TIMEOUT: &str = "REPORTHER_ACTOR_WAIT_TIMEOUT_MS";
pub const ENV_POLL_INTERVAL: &str = "REPORTHER_POLL_INTERVAL_MS";
pub const ENV_CACHE_BUFFER: &str = "REPORTHER_CACHE_BUFFER";
pub const ENV_STORAGE_PATH: &str = "REPORTHER_STORAGE_PATH";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid value {value:?} for {name}")]
    InvalidVar { name: &'static str, value: String },
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// How long a write waits for the backend handle before giving up.
    pub actor_wait_timeout_ms: u64,
    pub poll_interval_ms: u64,
    /// Capacity of the cache actor's request channel.
    pub cache_buffer: usize,
    /// Where device-local settings are kept; in memory when unset.
    pub storage_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            actor_wait_timeout_ms: DEFAULT_WAIT_TIMEOUT.as_millis() as u64,
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            cache_buffer: 64,
            storage_path: None,
        }
    }
}

impl AppConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "Loaded config file");
        Self::from_json(&json)
    }

    /// Defaults, then `file` if given, then the process environment.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok())
    }

    /// Overrides fields from variables returned by `lookup`.
    pub fn apply_env<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_WAIT_TIMEOUT) {
            self.actor_wait_timeout_ms = parse_var(ENV_WAIT_TIMEOUT, &value)?;
        }
        if let Some(value) = lookup(ENV_POLL_INTERVAL) {
            self.poll_interval_ms = parse_var(ENV_POLL_INTERVAL, &value)?;
        }
        if let Some(value) = lookup(ENV_CACHE_BUFFER) {
            self.cache_buffer = parse_var(ENV_CACHE_BUFFER, &value)?;
        }
        if let Some(value) = lookup(ENV_STORAGE_PATH) {
            let value = value.trim();
            self.storage_path = (!value.is_empty()).then(|| PathBuf::from(value));
        }
        self.validate()
    }

    pub fn wait_options(&self) -> WaitOptions {
        WaitOptions {
            timeout: Duration::from_millis(self.actor_wait_timeout_ms),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
        }
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.actor_wait_timeout_ms == 0 {
            return Err(ConfigError::Zero("actor_wait_timeout_ms"));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Zero("poll_interval_ms"));
        }
        if self.cache_buffer == 0 {
            return Err(ConfigError::Zero("cache_buffer"));
        }
        Ok(self)
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidVar {
        name,
        value: value.to_string(),
    })
}
