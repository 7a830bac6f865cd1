//! Service configuration, read from the environment (and `.env` if present).

use std::time::Duration;

use crate::utils::RetryConfig;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be a valid {expected}, got {value:?}")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// `None` runs against the in-memory store
    pub database: Option<DatabaseConfig>,
    /// Port of the /metrics and /health endpoint
    pub metrics_port: u16,
    /// Backoff for the deferred cook transition
    pub cook_retry: RetryConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database = match lookup("DATABASE_URL").filter(|url| !url.is_empty()) {
            Some(url) => Some(DatabaseConfig {
                url,
                max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", "u32", 5)?,
            }),
            None => None,
        };

        let attempts: u32 = parse_or(&lookup, "COOK_RETRY_ATTEMPTS", "u32", 3)?;

        Ok(Self {
            database,
            metrics_port: parse_or(&lookup, "METRICS_PORT", "port number", 9090)?,
            cook_retry: RetryConfig {
                initial_delay: Duration::from_millis(200),
                ..RetryConfig::default()
            }
            .with_max_attempts(attempts),
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    expected: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            expected,
            value,
        }),
    }
}
