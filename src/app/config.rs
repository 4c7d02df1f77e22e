use crate::shared::config::{AppConfig, AppConfigBuilder, ConfigError};
use std::path::PathBuf;
use std::time::Duration;

/// Default server URL
const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:3000";

/// Client configuration: the app settings plus the session token.
#[derive(Debug, Clone)]
pub struct Config {
    app: AppConfig,
    token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        let mut builder = AppConfig::builder().server_url(
            std::env::var("CLUBHUB_API_URL").unwrap_or_else(|_| DEFAULT_SERVER_URL.to_string()),
        );
        if let Some(ms) = std::env::var("CLUBHUB_REQUEST_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|ms| *ms > 0)
        {
            builder = builder.request_timeout(Duration::from_millis(ms));
        }
        if let Ok(path) = std::env::var("CLUBHUB_CACHE_PATH") {
            builder = builder.cache_path(path);
        }

        let app = builder.build().unwrap_or_else(|e| {
            tracing::warn!("Ignoring invalid environment configuration: {}", e);
            AppConfig::default()
        });
        Self { app, token: None }
    }
}

impl Config {
    /// Create a new configuration from the environment
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builder(builder: AppConfigBuilder) -> Result<Self, ConfigError> {
        let app = builder.build()?;
        Ok(Self { app, token: None })
    }

    /// Read a TOML configuration file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Parse(format!("{}: {}", path.as_ref().display(), e)))?;
        Ok(Self {
            app: AppConfig::from_toml_str(&source)?,
            token: None,
        })
    }

    /// Set the session token
    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    /// Get the session token
    pub fn get_token(&self) -> Option<&String> {
        self.token.as_ref()
    }

    /// Clear the token (logout)
    pub fn clear_token(&mut self) {
        self.token = None;
    }

    /// Get the full URL for an API endpoint
    pub fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.server_url(), path)
    }

    pub fn server_url(&self) -> &str {
        self.app.server_url.as_deref().unwrap_or(DEFAULT_SERVER_URL)
    }

    pub fn request_timeout(&self) -> Duration {
        self.app.request_timeout
    }

    /// Snapshot database location; the platform data dir unless configured
    pub fn cache_path(&self) -> PathBuf {
        self.app.cache_path.clone().unwrap_or_else(|| {
            let mut path = dirs::data_dir().unwrap_or_else(std::env::temp_dir);
            path.push("clubhub");
            path.push("snapshots.db");
            path
        })
    }

    pub fn seed_fallback(&self) -> bool {
        self.app.seed_fallback
    }
}
