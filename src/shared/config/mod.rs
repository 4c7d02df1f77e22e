//! Application configuration module
//!
//! Provides configuration types for the application. A configuration can be
//! assembled with [`AppConfigBuilder`] or read from a TOML document:
//!
//! ```toml
//! server_url = "https://api.clubhub.example"
//! request_timeout_ms = 5000
//! cache_path = "/var/lib/clubhub/snapshots.db"
//! seed_fallback = true
//! ```

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Default timeout for a single backend call
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(8);

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Server URL
    pub server_url: Option<String>,
    /// Timeout applied to every backend call
    pub request_timeout: Duration,
    /// Location of the local snapshot database
    pub cache_path: Option<PathBuf>,
    /// Whether reads may fall back to the built-in demo clubs
    pub seed_fallback: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            cache_path: None,
            seed_fallback: true,
        }
    }
}

/// On-disk shape of the configuration file
#[derive(Debug, Deserialize)]
struct ConfigFile {
    server_url: Option<String>,
    request_timeout_ms: Option<u64>,
    cache_path: Option<PathBuf>,
    seed_fallback: Option<bool>,
}

impl AppConfig {
    /// Create a new AppConfigBuilder
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Parse a TOML configuration document
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile =
            toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;

        let mut builder = AppConfig::builder();
        if let Some(url) = file.server_url {
            builder = builder.server_url(url);
        }
        if let Some(ms) = file.request_timeout_ms {
            builder = builder.request_timeout(Duration::from_millis(ms));
        }
        if let Some(path) = file.cache_path {
            builder = builder.cache_path(path);
        }
        if let Some(seed) = file.seed_fallback {
            builder = builder.seed_fallback(seed);
        }
        builder.build()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.server_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::InvalidUrl(url.clone()));
            }
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout);
        }
        Ok(())
    }
}

/// Builder for AppConfig
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    server_url: Option<String>,
    request_timeout: Option<Duration>,
    cache_path: Option<PathBuf>,
    seed_fallback: Option<bool>,
}

impl AppConfigBuilder {
    /// Set the server URL
    pub fn server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = Some(url.into().trim_end_matches('/').to_string());
        self
    }

    /// Set the per-call timeout
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Set the snapshot database path
    pub fn cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = Some(path.into());
        self
    }

    /// Enable or disable the seed fallback
    pub fn seed_fallback(mut self, enabled: bool) -> Self {
        self.seed_fallback = Some(enabled);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<AppConfig, ConfigError> {
        let config = AppConfig {
            server_url: self.server_url,
            request_timeout: self.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT),
            cache_path: self.cache_path,
            seed_fallback: self.seed_fallback.unwrap_or(true),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("request timeout must be greater than zero")]
    InvalidTimeout,
    #[error("could not parse configuration: {0}")]
    Parse(String),
}
