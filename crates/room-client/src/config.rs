//! Room client configuration.
//!
//! Configuration is loaded from environment variables.

use std::collections::HashMap;
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Path of the token endpoint, relative to the base URL.
pub const JOIN_ROOM_PATH: &str = "/join-room";

/// Default HTTP request timeout in seconds.
pub const DEFAULT_HTTP_TIMEOUT_SECONDS: u64 = 10;

/// Default HTTP connect timeout in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECONDS: u64 = 5;

/// Room client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the server hosting the join-room endpoint
    /// (e.g., `https://rooms.example.com`).
    pub base_url: String,

    /// Overall timeout for one token request.
    pub http_timeout: Duration,

    /// TCP/TLS connect timeout for the token request.
    pub connect_timeout: Duration,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl ClientConfig {
    /// Create a configuration with default timeouts.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECONDS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECONDS),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let base_url = vars
            .get("ROOM_CLIENT_BASE_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("ROOM_CLIENT_BASE_URL".to_string()))?
            .trim_end_matches('/')
            .to_string();

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue(format!(
                "ROOM_CLIENT_BASE_URL must be an http(s) URL, got '{base_url}'"
            )));
        }

        let http_timeout = parse_seconds(
            vars,
            "ROOM_CLIENT_HTTP_TIMEOUT_SECONDS",
            DEFAULT_HTTP_TIMEOUT_SECONDS,
        )?;

        let connect_timeout = parse_seconds(
            vars,
            "ROOM_CLIENT_CONNECT_TIMEOUT_SECONDS",
            DEFAULT_CONNECT_TIMEOUT_SECONDS,
        )?;

        Ok(ClientConfig {
            base_url,
            http_timeout,
            connect_timeout,
        })
    }

    /// Full URL of the join-room token endpoint.
    #[must_use]
    pub fn join_room_url(&self) -> String {
        format!("{}{}", self.base_url, JOIN_ROOM_PATH)
    }
}

fn parse_seconds(
    vars: &HashMap<String, String>,
    key: &str,
    default: u64,
) -> Result<Duration, ConfigError> {
    match vars.get(key) {
        None => Ok(Duration::from_secs(default)),
        Some(raw) => match raw.parse::<u64>() {
            Ok(0) | Err(_) => Err(ConfigError::InvalidValue(format!(
                "{key} must be a positive integer, got '{raw}'"
            ))),
            Ok(secs) => Ok(Duration::from_secs(secs)),
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn base_vars() -> HashMap<String, String> {
        HashMap::from([(
            "ROOM_CLIENT_BASE_URL".to_string(),
            "http://localhost:3000".to_string(),
        )])
    }

    #[test]
    fn test_from_vars_success_with_defaults() {
        let config = ClientConfig::from_vars(&base_vars()).expect("Config should load");

        assert_eq!(config.base_url, "http://localhost:3000");
        assert_eq!(
            config.http_timeout,
            Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECONDS)
        );
        assert_eq!(
            config.connect_timeout,
            Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECONDS)
        );
        assert_eq!(config.join_room_url(), "http://localhost:3000/join-room");
    }

    #[test]
    fn test_from_vars_success_with_custom_values() {
        let mut vars = base_vars();
        vars.insert(
            "ROOM_CLIENT_BASE_URL".to_string(),
            "https://rooms.example.com/".to_string(),
        );
        vars.insert(
            "ROOM_CLIENT_HTTP_TIMEOUT_SECONDS".to_string(),
            "30".to_string(),
        );
        vars.insert(
            "ROOM_CLIENT_CONNECT_TIMEOUT_SECONDS".to_string(),
            "2".to_string(),
        );

        let config = ClientConfig::from_vars(&vars).expect("Config should load");

        // Trailing slash is stripped so the path joins cleanly
        assert_eq!(config.base_url, "https://rooms.example.com");
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        assert_eq!(config.connect_timeout, Duration::from_secs(2));
        assert_eq!(
            config.join_room_url(),
            "https://rooms.example.com/join-room"
        );
    }

    #[test]
    fn test_from_vars_missing_base_url() {
        let result = ClientConfig::from_vars(&HashMap::new());
        assert!(
            matches!(result, Err(ConfigError::MissingEnvVar(v)) if v == "ROOM_CLIENT_BASE_URL")
        );
    }

    #[test]
    fn test_from_vars_rejects_non_http_url() {
        let mut vars = base_vars();
        vars.insert(
            "ROOM_CLIENT_BASE_URL".to_string(),
            "ftp://example.com".to_string(),
        );

        let result = ClientConfig::from_vars(&vars);
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_from_vars_rejects_bad_timeouts() {
        for bad in ["0", "-1", "soon"] {
            let mut vars = base_vars();
            vars.insert(
                "ROOM_CLIENT_HTTP_TIMEOUT_SECONDS".to_string(),
                bad.to_string(),
            );

            let result = ClientConfig::from_vars(&vars);
            assert!(
                matches!(result, Err(ConfigError::InvalidValue(ref msg)) if msg.contains(bad)),
                "timeout '{bad}' should be rejected"
            );
        }
    }

    #[test]
    fn test_new_uses_defaults() {
        let config = ClientConfig::new("http://127.0.0.1:9");
        assert_eq!(config.http_timeout.as_secs(), DEFAULT_HTTP_TIMEOUT_SECONDS);
        assert_eq!(
            config.connect_timeout.as_secs(),
            DEFAULT_CONNECT_TIMEOUT_SECONDS
        );
    }
}
