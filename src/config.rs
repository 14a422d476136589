//! Runtime configuration.
//!
//! [`EngineConfig`] holds the engine's tuning knobs and is what library
//! users construct. [`Config`] is the command line surface of the binary
//! and lowers into an `EngineConfig`.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::crypto::Chain;
use crate::logging::LogFormat;
use crate::matcher::normalize_prefix;

/// Default attempt budget per search.
pub const DEFAULT_MAX_ATTEMPTS: u64 = 1_000_000;

/// Engine tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Candidates generated per tick of a job
    pub batch_size: u64,
    /// Pause between the end of one batch and the next tick of the same job
    pub tick_interval: Duration,
    /// Delay before a new job's first tick
    pub start_delay: Duration,
    /// Jobs older than this are evicted, running or not
    pub retention: Duration,
    /// How often the eviction sweep runs
    pub sweep_interval: Duration,
    /// Batch worker threads
    pub workers: usize,
    /// Compare prefixes against addresses case-sensitively
    pub case_sensitive: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            batch_size: 1_000,
            tick_interval: Duration::from_millis(50),
            start_delay: Duration::from_millis(100),
            retention: Duration::from_secs(60 * 60),
            sweep_interval: Duration::from_secs(5 * 60),
            workers: num_cpus::get(),
            case_sensitive: true,
        }
    }
}

impl EngineConfig {
    /// Validates the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::InvalidValue("batch size must be at least 1".into()));
        }

        if self.workers == 0 {
            return Err(ConfigError::InvalidValue("worker count must be at least 1".into()));
        }

        if self.tick_interval.is_zero() {
            return Err(ConfigError::InvalidValue("tick interval must be non-zero".into()));
        }

        if self.sweep_interval.is_zero() {
            return Err(ConfigError::InvalidValue("sweep interval must be non-zero".into()));
        }

        Ok(())
    }
}

/// Vanity Address Search Engine
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Prefix to search for (1-8 letters or digits). Repeat to run several searches at once.
    #[arg(short, long = "prefix", required = true)]
    pub prefixes: Vec<String>,

    /// Network label reported with each result
    #[arg(short = 'N', long, default_value = "devnet")]
    pub network: String,

    /// Address family: solana or ethereum
    #[arg(short = 'C', long, default_value = "solana")]
    pub chain: Chain,

    /// Give up after this many keypairs per search
    #[arg(short, long, default_value_t = DEFAULT_MAX_ATTEMPTS)]
    pub max_attempts: u64,

    /// Keypairs generated per scheduling tick
    #[arg(long, default_value = "1000")]
    pub batch_size: u64,

    /// Milliseconds between ticks of the same search
    #[arg(long, default_value = "50")]
    pub tick_ms: u64,

    /// Number of worker threads (default: number of CPU cores)
    #[arg(short = 'w', long)]
    pub workers: Option<usize>,

    /// Match the prefix regardless of letter case
    #[arg(short = 'i', long, default_value = "false")]
    pub case_insensitive: bool,

    /// Progress report interval in seconds
    #[arg(short = 'r', long, default_value = "5")]
    pub report_interval: u64,

    /// Seconds a search is kept before eviction
    #[arg(long, default_value = "3600")]
    pub retention_secs: u64,

    /// Seconds between eviction sweeps
    #[arg(long, default_value = "300")]
    pub sweep_secs: u64,

    /// Directory to write found keypairs to as JSON
    #[arg(short = 'o', long)]
    pub out_dir: Option<PathBuf>,

    /// Log filter (overridden by RUST_LOG)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Log format: compact or json
    #[arg(long, default_value = "compact")]
    pub log_format: LogFormat,
}

impl Config {
    /// Returns the number of workers, defaulting to CPU count
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(num_cpus::get)
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        for prefix in &self.prefixes {
            normalize_prefix(prefix).map_err(|e| ConfigError::InvalidPattern(e.to_string()))?;
        }

        if self.max_attempts == 0 {
            return Err(ConfigError::InvalidValue(
                "max attempts must be greater than zero".into(),
            ));
        }

        if self.report_interval == 0 {
            return Err(ConfigError::InvalidValue(
                "report interval must be at least 1 second".into(),
            ));
        }

        self.engine_config().validate()
    }

    /// Lowers the command line into engine settings.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            batch_size: self.batch_size,
            tick_interval: Duration::from_millis(self.tick_ms),
            retention: Duration::from_secs(self.retention_secs),
            sweep_interval: Duration::from_secs(self.sweep_secs),
            workers: self.worker_count(),
            case_sensitive: !self.case_insensitive,
            ..EngineConfig::default()
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_test_config(prefix: &str) -> Config {
        Config {
            prefixes: vec![prefix.into()],
            network: "devnet".into(),
            chain: Chain::Solana,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            batch_size: 1000,
            tick_ms: 50,
            workers: None,
            case_insensitive: false,
            report_interval: 5,
            retention_secs: 3600,
            sweep_secs: 300,
            out_dir: None,
            log_level: "info".into(),
            log_format: LogFormat::Compact,
        }
    }

    #[test]
    fn test_valid_pattern() {
        let config = make_test_config("SoL");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(make_test_config("so-l").validate().is_err());
        assert!(make_test_config("ABCDEFGHI").validate().is_err());
    }

    #[test]
    fn test_zero_batch_rejected() {
        let mut config = make_test_config("AB");
        config.batch_size = 0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_cli_parsing() {
        let config = Config::try_parse_from([
            "vanity_jobs", "-p", "ab", "-p", "CD", "-C", "eth", "-m", "500", "-i",
        ])
        .unwrap();
        assert_eq!(config.prefixes, vec!["ab", "CD"]);
        assert_eq!(config.chain, Chain::Ethereum);
        assert_eq!(config.max_attempts, 500);

        let engine = config.engine_config();
        assert!(!engine.case_sensitive);
        assert_eq!(engine.batch_size, 1000);
        assert_eq!(engine.tick_interval, Duration::from_millis(50));
        assert_eq!(engine.retention, Duration::from_secs(3600));
    }
}
