//! Storefront client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `ECOMWEB_API_BASE` - Base URL of the REST backend (default: `http://localhost:8080/api`)
//! - `ECOMWEB_SESSION_FILE` - Where the signed-in user is persisted (default: `.ecomweb/session.json`)
//! - `ECOMWEB_REQUEST_TIMEOUT_SECS` - Per-request timeout in seconds (default: 30)
//! - `ECOMWEB_PLACEHOLDER_IMAGE` - Image shown for products without one
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_BASE: &str = "http://localhost:8080/api";
const DEFAULT_SESSION_FILE: &str = ".ecomweb/session.json";
const DEFAULT_TIMEOUT_SECS: &str = "30";

/// Inline SVG shown when a product has neither stored image bytes nor a URL.
pub const DEFAULT_PLACEHOLDER_IMAGE: &str = "data:image/svg+xml,%3Csvg xmlns='http://www.w3.org/2000/svg' width='300' height='200'%3E%3Crect width='300' height='200' fill='%23eeeeee'/%3E%3Ctext x='150' y='105' text-anchor='middle' fill='%23999999'%3ENo Image%3C/text%3E%3C/svg%3E";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
///
/// Implements `Debug` manually to redact the Sentry DSN.
#[derive(Clone)]
pub struct StorefrontConfig {
    /// Base URL every REST path is joined onto
    pub api_base: Url,
    /// File holding the serialized current user
    pub session_file: PathBuf,
    /// Timeout applied to every request
    pub request_timeout: Duration,
    /// Image shown for products without one
    pub placeholder_image: String,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

impl std::fmt::Debug for StorefrontConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorefrontConfig")
            .field("api_base", &self.api_base.as_str())
            .field("session_file", &self.session_file)
            .field("request_timeout", &self.request_timeout)
            .field("placeholder_image", &self.placeholder_image)
            .field(
                "sentry_dsn",
                &self.sentry_dsn.as_ref().map(|_| "[REDACTED]"),
            )
            .field("sentry_environment", &self.sentry_environment)
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_base = parse_api_base(&get_env_or_default("ECOMWEB_API_BASE", DEFAULT_API_BASE))?;
        let session_file = PathBuf::from(get_env_or_default(
            "ECOMWEB_SESSION_FILE",
            DEFAULT_SESSION_FILE,
        ));
        let request_timeout = parse_timeout(&get_env_or_default(
            "ECOMWEB_REQUEST_TIMEOUT_SECS",
            DEFAULT_TIMEOUT_SECS,
        ))?;
        let placeholder_image = get_optional_env("ECOMWEB_PLACEHOLDER_IMAGE")
            .unwrap_or_else(|| DEFAULT_PLACEHOLDER_IMAGE.to_string());

        Ok(Self {
            api_base,
            session_file,
            request_timeout,
            placeholder_image,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Configuration pointing at `api_base` with every other value defaulted.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `api_base` is not an absolute URL.
    pub fn for_api_base(api_base: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api_base: parse_api_base(api_base)?,
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
            request_timeout: parse_timeout(DEFAULT_TIMEOUT_SECS)?,
            placeholder_image: DEFAULT_PLACEHOLDER_IMAGE.to_string(),
            sentry_dsn: None,
            sentry_environment: None,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse the API base, normalizing it to end with `/` so relative joins
/// append to the path instead of replacing its last segment.
fn parse_api_base(value: &str) -> Result<Url, ConfigError> {
    let mut normalized = value.trim().to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }

    let url = Url::parse(&normalized)
        .map_err(|e| ConfigError::InvalidEnvVar("ECOMWEB_API_BASE".to_string(), e.to_string()))?;

    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidEnvVar(
            "ECOMWEB_API_BASE".to_string(),
            "must be an absolute http(s) URL".to_string(),
        ));
    }

    Ok(url)
}

fn parse_timeout(value: &str) -> Result<Duration, ConfigError> {
    let secs = value.trim().parse::<u64>().map_err(|e| {
        ConfigError::InvalidEnvVar("ECOMWEB_REQUEST_TIMEOUT_SECS".to_string(), e.to_string())
    })?;

    if secs == 0 {
        return Err(ConfigError::InvalidEnvVar(
            "ECOMWEB_REQUEST_TIMEOUT_SECS".to_string(),
            "must be greater than 0".to_string(),
        ));
    }

    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_api_base_appends_trailing_slash() {
        let url = parse_api_base("http://localhost:8080/api").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/");
        assert_eq!(
            url.join("cart/add").unwrap().as_str(),
            "http://localhost:8080/api/cart/add"
        );
    }

    #[test]
    fn test_parse_api_base_rejects_relative() {
        let result = parse_api_base("/api");
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(_, _))));
    }

    #[test]
    fn test_parse_api_base_rejects_non_base_urls() {
        assert!(parse_api_base("mailto:shop@example.com").is_err());
    }

    #[test]
    fn test_parse_timeout() {
        assert_eq!(parse_timeout("5").unwrap(), Duration::from_secs(5));
        assert!(parse_timeout("0").is_err());
        assert!(parse_timeout("soon").is_err());
    }

    #[test]
    fn test_for_api_base_defaults() {
        let config = StorefrontConfig::for_api_base("http://127.0.0.1:9000/api").unwrap();
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.session_file, PathBuf::from(".ecomweb/session.json"));
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_debug_redacts_sentry_dsn() {
        let mut config = StorefrontConfig::for_api_base("http://localhost/api").unwrap();
        config.sentry_dsn = Some("https://super_secret_key@sentry.example.com/1".to_string());

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_key"));
    }
}
