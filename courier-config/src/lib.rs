//! Configuration management for Courier services

pub mod transport;

pub use transport::{FileTransportSource, StaticTransportSource, TransportConfigSource};

use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading worker settings or transport parameters
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration source unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid setting {name}: {value:?}")]
    InvalidSetting { name: String, value: String },

    #[error(transparent)]
    Parameter(#[from] courier_types::CourierError),

    #[error("Configuration error: {0}")]
    Source(#[from] config::ConfigError),
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Console,
}

/// Worker configuration
#[derive(Debug, Clone, Deserialize)]
pub struct WorkerConfig {
    /// File holding the `mail.smtp.*` transport parameters
    pub transport_file: PathBuf,
    /// Queue capacity; `None` keeps the queue unbounded
    pub queue_capacity: Option<usize>,
    /// Network timeout for one SMTP exchange
    pub smtp_timeout_secs: u64,
    pub log_level: Option<String>,
    pub log_format: LogFormat,
}

impl WorkerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        let transport_file = env::var("COURIER_TRANSPORT_FILE")
            .unwrap_or_else(|_| "transport.toml".to_string())
            .into();

        let queue_capacity = match env::var("COURIER_QUEUE_CAPACITY") {
            Ok(value) => Some(parse_setting("COURIER_QUEUE_CAPACITY", &value)?),
            Err(_) => None,
        };

        let smtp_timeout_secs = match env::var("COURIER_SMTP_TIMEOUT_SECS") {
            Ok(value) => parse_setting("COURIER_SMTP_TIMEOUT_SECS", &value)?,
            Err(_) => 10,
        };

        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let log_format = match env::var("LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            Ok("console") | Err(_) => LogFormat::Console,
            Ok(other) => {
                return Err(ConfigError::InvalidSetting {
                    name: "LOG_FORMAT".to_string(),
                    value: other.to_string(),
                })
            }
        };

        Ok(Self {
            transport_file,
            queue_capacity,
            smtp_timeout_secs,
            log_level: Some(log_level),
            log_format,
        })
    }

    /// Get log level, defaulting to "info"
    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }
}

fn parse_setting<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidSetting {
        name: name.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_setting_accepts_padded_numbers() {
        let capacity: usize = parse_setting("COURIER_QUEUE_CAPACITY", " 64 ").unwrap();
        assert_eq!(capacity, 64);
    }

    #[test]
    fn test_parse_setting_rejects_garbage() {
        let result: Result<u64, _> = parse_setting("COURIER_SMTP_TIMEOUT_SECS", "soon");
        assert!(matches!(result, Err(ConfigError::InvalidSetting { .. })));
    }

    #[test]
    fn test_log_level_default() {
        let config = WorkerConfig {
            transport_file: "transport.toml".into(),
            queue_capacity: None,
            smtp_timeout_secs: 10,
            log_level: None,
            log_format: LogFormat::Console,
        };
        assert_eq!(config.log_level(), "info");
    }
}
