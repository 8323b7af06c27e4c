//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `TIENDITA_API_URL` - Base URL of the marketplace API (e.g. `https://api.tienditacampus.mx/api`)
//!
//! ## Optional
//! - `TIENDITA_TIMEOUT_SECS` - Per-request timeout (default: 30)
//! - `TIENDITA_DEDUP_WINDOW_MS` - Window in which identical lifecycle requests are suppressed (default: 1500)
//! - `TIENDITA_SESSION_DIR` - Directory holding the persisted session (default: `$HOME/.tiendita`)
//! - `TIENDITA_LOG_FORMAT` - `pretty` or `json` (default: pretty)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_DEDUP_WINDOW_MS: u64 = 1500;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Log output format for binaries built on the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL every request path is joined onto.
    pub api_url: Url,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Window in which an identical lifecycle request is treated as a duplicate.
    pub dedup_window: Duration,
    /// Directory for the persisted session file.
    pub session_dir: Option<PathBuf>,
    /// Log output format.
    pub log_format: LogFormat,
}

impl ClientConfig {
    /// Configuration with defaults for everything but the API URL.
    #[must_use]
    pub fn new(api_url: Url) -> Self {
        Self {
            api_url: with_trailing_slash(api_url),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            dedup_window: Duration::from_millis(DEFAULT_DEDUP_WINDOW_MS),
            session_dir: None,
            log_format: LogFormat::Pretty,
        }
    }

    /// Override the suppression window for duplicate lifecycle requests.
    #[must_use]
    pub const fn with_dedup_window(mut self, window: Duration) -> Self {
        self.dedup_window = window;
        self
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `TIENDITA_API_URL` is missing or any
    /// variable fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_url = get_required_env("TIENDITA_API_URL")?;
        let api_url = Url::parse(&api_url).map_err(|e| {
            ConfigError::InvalidEnvVar("TIENDITA_API_URL".to_string(), e.to_string())
        })?;
        let timeout_secs = parse_u64("TIENDITA_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;
        let dedup_ms = parse_u64("TIENDITA_DEDUP_WINDOW_MS", DEFAULT_DEDUP_WINDOW_MS)?;
        let session_dir = get_optional_env("TIENDITA_SESSION_DIR")
            .map(PathBuf::from)
            .or_else(|| get_optional_env("HOME").map(|home| PathBuf::from(home).join(".tiendita")));
        let log_format = parse_log_format(&get_env_or_default("TIENDITA_LOG_FORMAT", "pretty"))?;

        Ok(Self {
            api_url: with_trailing_slash(api_url),
            timeout: Duration::from_secs(timeout_secs),
            dedup_window: Duration::from_millis(dedup_ms),
            session_dir,
            log_format,
        })
    }
}

/// `Url::join` drops the last path segment unless the base ends in `/`.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

fn parse_log_format(value: &str) -> Result<LogFormat, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "pretty" => Ok(LogFormat::Pretty),
        "json" => Ok(LogFormat::Json),
        other => Err(ConfigError::InvalidEnvVar(
            "TIENDITA_LOG_FORMAT".to_string(),
            format!("expected pretty or json, got {other}"),
        )),
    }
}

fn parse_u64(key: &str, default: u64) -> Result<u64, ConfigError> {
    get_optional_env(key).map_or(Ok(default), |raw| {
        raw.parse::<u64>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_appends_trailing_slash() {
        let config = ClientConfig::new(Url::parse("http://localhost:3000/api").unwrap());
        assert_eq!(config.api_url.as_str(), "http://localhost:3000/api/");
        assert_eq!(
            config.api_url.join("orders/purchase").unwrap().as_str(),
            "http://localhost:3000/api/orders/purchase"
        );
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::new(Url::parse("http://localhost:3000/").unwrap());
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.dedup_window, Duration::from_millis(1500));
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_parse_log_format() {
        assert_eq!(parse_log_format("JSON").unwrap(), LogFormat::Json);
        assert!(matches!(
            parse_log_format("xml"),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
    }
}
