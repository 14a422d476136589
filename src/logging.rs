//! Logging setup, powered by tracing-subscriber.
//!
//! The engine only emits `tracing` events; installing a subscriber is the
//! binary's job.

use std::str::FromStr;

use tracing_subscriber::EnvFilter;

use crate::config::ConfigError;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Compact text format: timestamp LEVEL target - message
    #[default]
    Compact,
    /// JSON Lines format for structured logging
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "compact" | "text" => Ok(LogFormat::Compact),
            "json" | "jsonl" => Ok(LogFormat::Json),
            _ => Err(format!("Unknown log format: {}", s)),
        }
    }
}

/// Builds the filter from `RUST_LOG` if set, else from `level`.
fn build_env_filter(level: &str) -> Result<EnvFilter, ConfigError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(level)
        .map_err(|e| ConfigError::InvalidValue(format!("invalid log filter '{}': {}", level, e)))
}

/// Installs the global subscriber. Logs go to stderr so stdout stays free
/// for progress and results.
pub fn init_logging(level: &str, format: LogFormat) -> Result<(), ConfigError> {
    let filter = build_env_filter(level)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let installed = match format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|e| ConfigError::InvalidValue(format!("logging already initialized: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parse() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("compact".parse::<LogFormat>().unwrap(), LogFormat::Compact);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_bad_filter_rejected() {
        if std::env::var_os("RUST_LOG").is_none() {
            assert!(build_env_filter("vanity_jobs=loud").is_err());
        }
        assert!(build_env_filter("debug").is_ok());
    }
}
