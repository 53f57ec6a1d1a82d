//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional:
//! - `QKART_API_ENDPOINT` - Backend base URL (default: the hosted QKart API)
//! - `QKART_SESSION_PATH` - Durable session file (default: `.qkart/session.json`)
//! - `QKART_HTTP_TIMEOUT_SECS` - Per-request timeout (default: 30)
//! - `QKART_SEARCH_DEBOUNCE_MS` - Search debounce window (default: 500)
//! - `QKART_CATALOG_CACHE_TTL_SECS` - Product cache TTL (default: 300)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Hosted QKart backend.
pub const DEFAULT_API_ENDPOINT: &str = "https://qkart-frontend-bup8.onrender.com/api/v1";

const DEFAULT_SESSION_PATH: &str = ".qkart/session.json";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 500;
const DEFAULT_CATALOG_CACHE_TTL_SECS: u64 = 300;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Base URL of the QKart REST API (no trailing slash)
    pub api_endpoint: Url,
    /// File holding the persisted session
    pub session_path: PathBuf,
    /// Timeout applied to every backend request
    pub http_timeout: Duration,
    /// Input inactivity required before a search fires
    pub search_debounce: Duration,
    /// How long the product catalog stays cached
    pub catalog_cache_ttl: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_endpoint = parse_endpoint(
            "QKART_API_ENDPOINT",
            &get_env_or_default("QKART_API_ENDPOINT", DEFAULT_API_ENDPOINT),
        )?;
        let session_path = PathBuf::from(get_env_or_default(
            "QKART_SESSION_PATH",
            DEFAULT_SESSION_PATH,
        ));
        let http_timeout = Duration::from_secs(get_parsed_env(
            "QKART_HTTP_TIMEOUT_SECS",
            DEFAULT_HTTP_TIMEOUT_SECS,
        )?);
        let search_debounce = Duration::from_millis(get_parsed_env(
            "QKART_SEARCH_DEBOUNCE_MS",
            DEFAULT_SEARCH_DEBOUNCE_MS,
        )?);
        let catalog_cache_ttl = Duration::from_secs(get_parsed_env(
            "QKART_CATALOG_CACHE_TTL_SECS",
            DEFAULT_CATALOG_CACHE_TTL_SECS,
        )?);
        let sentry_dsn = get_optional_env("SENTRY_DSN");

        Ok(Self {
            api_endpoint,
            session_path,
            http_timeout,
            search_debounce,
            catalog_cache_ttl,
            sentry_dsn,
        })
    }

    /// Default configuration pointed at a specific backend.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `endpoint` is not an absolute http(s) URL.
    pub fn for_endpoint(endpoint: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api_endpoint: parse_endpoint("api_endpoint", endpoint)?,
            session_path: PathBuf::from(DEFAULT_SESSION_PATH),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            search_debounce: Duration::from_millis(DEFAULT_SEARCH_DEBOUNCE_MS),
            catalog_cache_ttl: Duration::from_secs(DEFAULT_CATALOG_CACHE_TTL_SECS),
            sentry_dsn: None,
        })
    }

    /// Base URL as a string without a trailing slash.
    #[must_use]
    pub fn api_base(&self) -> &str {
        self.api_endpoint.as_str().trim_end_matches('/')
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Get an environment variable parsed into `T`, or the default if unset.
fn get_parsed_env<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_optional_env(key).map_or(Ok(default), |value| parse_value(key, &value))
}

fn parse_value<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse and validate the backend base URL.
fn parse_endpoint(key: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }

    Ok(url)
}
