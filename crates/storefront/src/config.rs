//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `PAPERBACK_DATABASE_URL` - `SQLite` connection string (e.g.,
//!   `sqlite://paperback.db?mode=rwc`); falls back to `DATABASE_URL`
//!
//! ## Optional
//! - `PAPERBACK_HOST` - Bind address (default: 127.0.0.1)
//! - `PAPERBACK_PORT` - Listen port (default: 8000)
//! - `PAPERBACK_BASE_URL` - Public URL (default: `http://localhost:8000`)
//! - `PAYMENT_GATEWAY_TOKEN` - Shared secret the payment gateway presents in
//!   `X-Gateway-Token` on callbacks; callbacks are accepted unauthenticated
//!   when unset (development only)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `SQLite` database connection URL
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Shared secret expected from the payment gateway on callbacks
    pub gateway_token: Option<SecretString>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("PAPERBACK_DATABASE_URL")?;
        let host = get_env_or_default("PAPERBACK_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("PAPERBACK_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("PAPERBACK_PORT", "8000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("PAPERBACK_PORT".to_string(), e.to_string()))?;
        let base_url = get_env_or_default("PAPERBACK_BASE_URL", "http://localhost:8000");
        url::Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("PAPERBACK_BASE_URL".to_string(), e.to_string())
        })?;

        let gateway_token = get_optional_env("PAYMENT_GATEWAY_TOKEN").map(SecretString::from);
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            gateway_token,
            sentry_dsn,
            sentry_environment,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Configuration suitable for tests: in-memory database, no Sentry.
    #[must_use]
    pub fn for_tests() -> Self {
        Self {
            database_url: SecretString::from("sqlite::memory:"),
            host: IpAddr::from([127, 0, 0, 1]),
            port: 0,
            base_url: "http://localhost:8000".to_string(),
            gateway_token: None,
            sentry_dsn: None,
            sentry_environment: None,
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
