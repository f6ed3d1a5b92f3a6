//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. Configuration file (config/local.toml)
//! 3. Environment variables (override)

use serde::Deserialize;
use url::Url;

/// Main application configuration
///
/// Built once at startup and shared immutably through `AppState`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub github: GitHubConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Port number (e.g., 8000)
    pub port: u16,
    /// Public URL the browser reaches us on (e.g., "http://localhost:8000")
    ///
    /// Falls back to `http://{host}:{port}` when unset.
    #[serde(default)]
    pub public_url: Option<String>,
}

impl ServerConfig {
    /// Get the base URL for the application
    ///
    /// # Returns
    /// URL without a trailing slash, like "http://localhost:8000"
    pub fn base_url(&self) -> String {
        match self.public_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => url.trim_end_matches('/').to_string(),
            _ => format!("http://{}:{}", self.host, self.port),
        }
    }

    /// OAuth entry route (`{base}/github`)
    pub fn entry_url(&self) -> String {
        format!("{}/github", self.base_url())
    }

    /// Redirect URI registered with the GitHub OAuth app
    pub fn callback_url(&self) -> String {
        format!("{}/github/callback", self.base_url())
    }

    pub fn is_https(&self) -> bool {
        self.base_url().starts_with("https://")
    }
}

/// GitHub OAuth application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Authorization endpoint
    pub authorize_url: String,
    /// Token exchange endpoint
    pub token_url: String,
    /// REST API base (e.g., "https://api.github.com")
    pub api_url: String,
    /// Space separated scopes requested at login
    pub scope: String,
}

impl GitHubConfig {
    /// API endpoint for a path relative to `api_url`
    pub fn api_endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Signed cookie session configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// HMAC secret key (32+ bytes)
    pub secret: String,
    /// Cookie name (default: "session")
    pub cookie_name: String,
    /// Session max age in seconds (default: 1209600 = 14 days)
    pub max_age: i64,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/local.toml (if exists)
    /// 4. Environment variables (GITHUB_OAUTH_DEMO__*)
    /// 5. `CLIENT_ID` / `CLIENT_SECRET`
    ///
    /// # Errors
    /// Returns error if configuration is invalid
    pub fn load() -> Result<Self, crate::error::AppError> {
        use config::{Config, Environment, File};

        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8000)?
            .set_default("github.client_id", "")?
            .set_default("github.client_secret", "")?
            .set_default(
                "github.authorize_url",
                "https://github.com/login/oauth/authorize",
            )?
            .set_default(
                "github.token_url",
                "https://github.com/login/oauth/access_token",
            )?
            .set_default("github.api_url", "https://api.github.com")?
            .set_default("github.scope", "user public_repo")?
            .set_default("session.cookie_name", "session")?
            .set_default("session.max_age", 1_209_600)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            // Load from config/default.toml if it exists
            .add_source(File::with_name("config/default").required(false))
            // Load from config/local.toml if it exists (overrides default)
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables (GITHUB_OAUTH_DEMO__*)
            .add_source(
                Environment::with_prefix("GITHUB_OAUTH_DEMO")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            // GitHub app credentials under their conventional names
            .set_override_option("github.client_id", std::env::var("CLIENT_ID").ok())?
            .set_override_option("github.client_secret", std::env::var("CLIENT_SECRET").ok())?
            .build()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;
        app_config.validate()?;
        Ok(app_config)
    }

    pub(crate) fn validate(&self) -> Result<(), crate::error::AppError> {
        use crate::error::AppError;

        const MIN_SESSION_SECRET_BYTES: usize = 32;

        if self.session.secret.as_bytes().len() < MIN_SESSION_SECRET_BYTES {
            return Err(AppError::Config(format!(
                "session.secret must be at least {} bytes",
                MIN_SESSION_SECRET_BYTES
            )));
        }

        if self.session.max_age <= 0 {
            return Err(AppError::Config(
                "session.max_age must be greater than 0".to_string(),
            ));
        }

        if self.github.client_id.trim().is_empty() {
            return Err(AppError::Config(
                "github.client_id (CLIENT_ID) must be set".to_string(),
            ));
        }

        for (key, value) in [
            ("github.authorize_url", self.github.authorize_url.clone()),
            ("github.token_url", self.github.token_url.clone()),
            ("github.api_url", self.github.api_url.clone()),
            ("server.public_url", self.server.base_url()),
        ] {
            Url::parse(&value)
                .map_err(|e| AppError::Config(format!("{key} is not a valid URL: {e}")))?;
        }

        Ok(())
    }
}
