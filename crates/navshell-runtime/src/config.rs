//! Shell configuration: defaults, optional TOML file, CLI/env overrides.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Timing for the announcement feed controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Delay between a fetch settling and the next fetch (default 60000).
    pub refresh_interval_ms: u64,
    /// Delay between the panel opening and the acknowledgment (default 1000).
    pub ack_delay_ms: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: 60_000,
            ack_delay_ms: 1_000,
        }
    }
}

impl FeedConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    pub fn ack_delay(&self) -> Duration {
        Duration::from_millis(self.ack_delay_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.refresh_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "feed.refresh_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.ack_delay_ms == 0 {
            return Err(ConfigError::Invalid(
                "feed.ack_delay_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Console API base URL; `/broadcasts/` is appended.
    pub api_url: String,
    pub api_token: Option<String>,
    pub request_timeout_secs: u64,
    /// Capacity of the host-event channel.
    pub event_buffer: usize,
    pub feed: FeedConfig,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:9000/api/0".to_string(),
            api_token: None,
            request_timeout_secs: 30,
            event_buffer: 64,
            feed: FeedConfig::default(),
        }
    }
}

/// Values supplied on the command line or through the environment. `None`
/// leaves the file/default value in place.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub api_url: Option<String>,
    pub api_token: Option<String>,
    pub refresh_interval_ms: Option<u64>,
    pub ack_delay_ms: Option<u64>,
}

impl ShellConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn apply(&mut self, overrides: &ConfigOverrides) {
        if let Some(ref url) = overrides.api_url {
            self.api_url = url.clone();
        }
        if let Some(ref token) = overrides.api_token {
            self.api_token = Some(token.clone());
        }
        if let Some(ms) = overrides.refresh_interval_ms {
            self.feed.refresh_interval_ms = ms;
        }
        if let Some(ms) = overrides.ack_delay_ms {
            self.feed.ack_delay_ms = ms;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_url.trim().is_empty() {
            return Err(ConfigError::Invalid("api_url must not be empty".to_string()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.event_buffer == 0 {
            return Err(ConfigError::Invalid(
                "event_buffer must be greater than zero".to_string(),
            ));
        }
        self.feed.validate()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
