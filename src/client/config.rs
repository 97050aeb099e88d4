use crate::shared::config::{AppConfig, AppConfigBuilder, ConfigError};
use std::path::PathBuf;

/// Default server URL
const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:3000";

/// Client configuration: an [`AppConfig`] plus environment overrides.
///
/// Recognized variables:
/// - `ENGAGEIQ_CONFIG`: path of a TOML file loaded first
/// - `ENGAGEIQ_API_URL`: remote store base URL
/// - `ENGAGEIQ_DATA_DIR`: directory for the local queue database
/// - `ENGAGEIQ_API_TOKEN`: bearer token sent with store requests
#[derive(Debug, Clone)]
pub struct Config {
    app: AppConfig,
    token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        let mut app = AppConfig::default();
        app.server_url = Some(DEFAULT_SERVER_URL.to_string());
        Self { app, token: None }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from `ENGAGEIQ_CONFIG` (if set) and apply environment overrides
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut app = match std::env::var("ENGAGEIQ_CONFIG") {
            Ok(path) => AppConfig::load(path)?,
            Err(_) => AppConfig::default(),
        };

        if let Ok(url) = std::env::var("ENGAGEIQ_API_URL") {
            app.server_url = Some(url);
        }
        if let Ok(dir) = std::env::var("ENGAGEIQ_DATA_DIR") {
            app.data_dir = Some(PathBuf::from(dir));
        }
        if app.server_url.is_none() {
            app.server_url = Some(DEFAULT_SERVER_URL.to_string());
        }
        app.validate()?;

        let token = std::env::var("ENGAGEIQ_API_TOKEN").ok().filter(|t| !t.is_empty());
        Ok(Self { app, token })
    }

    pub fn with_builder(builder: AppConfigBuilder) -> Result<Self, ConfigError> {
        let app = builder.build()?;
        Ok(Self { app, token: None })
    }

    /// Underlying application config
    pub fn app(&self) -> &AppConfig {
        &self.app
    }

    /// Mutable application config; call `app().validate()` after editing
    pub fn app_mut(&mut self) -> &mut AppConfig {
        &mut self.app
    }

    /// Set the API token
    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    /// Get the API token
    pub fn get_token(&self) -> Option<&String> {
        self.token.as_ref()
    }

    /// Get the full URL for an API endpoint
    pub fn api_url(&self, path: &str) -> String {
        let base = self.server_url().trim_end_matches('/');
        if path.starts_with('/') {
            format!("{}{}", base, path)
        } else {
            format!("{}/{}", base, path)
        }
    }

    pub fn server_url(&self) -> &str {
        self.app.server_url.as_deref().unwrap_or(DEFAULT_SERVER_URL)
    }

    /// Directory holding the local SQLite database
    pub fn data_dir(&self) -> Option<&PathBuf> {
        self.app.data_dir.as_ref()
    }
}
