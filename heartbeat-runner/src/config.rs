//! Serializable session configuration, loaded from TOML.
//!
//! ```toml
//! [backtest]
//! symbols = ["AAPL", "MSFT"]
//! data_dir = "data"
//! initial_capital = 100000.0
//! start_date = "2020-01-02"
//!
//! [strategy]
//! type = "MOVING_AVERAGE_CROSS"
//! short_window = 20
//! long_window = 100
//!
//! [execution]
//! exchange = "ARCA"
//! commission = { type = "TIERED" }
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use heartbeat_core::Timestamp;

/// Unique identifier for a session configuration (content-addressable hash).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to encode config: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Complete configuration for one session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BacktestConfig {
    pub backtest: BacktestSection,

    #[serde(default)]
    pub strategy: StrategyConfig,

    #[serde(default)]
    pub execution: ExecutionConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// `[backtest]`: universe, data source, capital and pacing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BacktestSection {
    /// Symbols to trade, in reporting order.
    pub symbols: Vec<String>,

    /// Directory holding `{SYMBOL}.csv` bar files.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_initial_capital")]
    pub initial_capital: f64,

    /// Pause between heartbeats in milliseconds; 0 for historical replay.
    #[serde(default)]
    pub heartbeat_ms: u64,

    /// Session start; bars before this date are dropped.
    pub start_date: NaiveDate,

    /// Annualization factor for the Sharpe ratio.
    #[serde(default = "default_periods_per_year")]
    pub periods_per_year: u32,
}

/// `[strategy]`: which signal generator to run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StrategyConfig {
    /// One LONG per symbol on its first bar, held to the end.
    #[default]
    BuyAndHold,

    /// Long while the short SMA of closes is above the long SMA.
    MovingAverageCross {
        short_window: usize,
        long_window: usize,
    },
}

/// `[execution]`: simulated broker settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExecutionConfig {
    /// Exchange label stamped on every fill.
    #[serde(default = "default_exchange")]
    pub exchange: String,

    #[serde(default)]
    pub commission: CommissionConfig,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            exchange: default_exchange(),
            commission: CommissionConfig::default(),
        }
    }
}

/// Commission model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommissionConfig {
    /// No commission.
    None,

    /// Fixed amount per fill.
    PerTrade { amount: f64 },

    /// Fixed amount per share.
    PerShare { amount: f64 },

    /// US equity fixed schedule: per-share rate by order size with a
    /// 1.30 minimum, capped at 0.5% of trade value.
    #[default]
    Tiered,
}

/// `[output]`: where and what to write after the session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub directory: PathBuf,

    #[serde(default = "default_true")]
    pub write_equity_csv: bool,

    #[serde(default = "default_true")]
    pub write_stats_json: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_dir(),
            write_equity_csv: true,
            write_stats_json: true,
        }
    }
}

impl BacktestConfig {
    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let bt = &self.backtest;
        if bt.symbols.is_empty() {
            return Err(ConfigError::Invalid("backtest.symbols is empty".into()));
        }
        if let Some(blank) = bt.symbols.iter().find(|s| s.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "backtest.symbols contains a blank entry: '{blank}'"
            )));
        }
        if bt.initial_capital.is_nan() || bt.initial_capital <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "backtest.initial_capital must be positive, got {}",
                bt.initial_capital
            )));
        }
        if bt.periods_per_year == 0 {
            return Err(ConfigError::Invalid(
                "backtest.periods_per_year must be at least 1".into(),
            ));
        }
        if let StrategyConfig::MovingAverageCross {
            short_window,
            long_window,
        } = self.strategy
        {
            if short_window == 0 || short_window >= long_window {
                return Err(ConfigError::Invalid(format!(
                    "moving average windows need 0 < short < long, got {short_window}/{long_window}"
                )));
            }
        }
        Ok(())
    }

    /// Deterministic BLAKE3 hash of the config's JSON form.
    ///
    /// Two sessions with identical configs share a RunId.
    pub fn run_id(&self) -> Result<RunId, ConfigError> {
        let json = serde_json::to_string(self)?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }

    /// Midnight UTC on the start date; timestamp of the seed snapshots.
    pub fn start_timestamp(&self) -> Timestamp {
        Utc.from_utc_datetime(&self.backtest.start_date.and_time(chrono::NaiveTime::MIN))
    }

    pub fn heartbeat(&self) -> Duration {
        Duration::from_millis(self.backtest.heartbeat_ms)
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("results")
}

fn default_initial_capital() -> f64 {
    100_000.0
}

fn default_periods_per_year() -> u32 {
    252
}

fn default_exchange() -> String {
    "ARCA".to_string()
}

fn default_true() -> bool {
    true
}
