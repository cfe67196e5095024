//! Session runner: wires config, bar data, collaborators and sinks.
//!
//! Entry points:
//! - `run_backtest()`: loads bars (CSV or synthetic), runs, writes outputs.
//!   Used by the CLI.
//! - `run_with_feed()`: takes a pre-built feed and an explicit sink. Used by
//!   sweeps and tests.

use std::path::PathBuf;

use thiserror::Error;
use tracing::info;

use heartbeat_core::{
    Backtest, BacktestError, BacktestReport, DataError, HistoricBarFeed, ReportSink,
};

use crate::config::{BacktestConfig, ConfigError};
use crate::data_loader::{load_csv_dir, synthetic_bars};
use crate::execution::SimulatedExecutionHandler;
use crate::reporting::{CsvEquitySink, JsonStatsSink};
use crate::strategies::build_strategy;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] DataError),
    #[error("session aborted: {0}")]
    Backtest(#[from] BacktestError),
    #[error("no bars loaded for any symbol")]
    NoBars,
}

/// Per-invocation overrides on top of the config.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Replace CSV data with this many synthetic bars per symbol.
    pub synthetic_bars: Option<usize>,
    /// Override `[output] directory`.
    pub output_dir: Option<PathBuf>,
}

/// Build the aligned feed for a config.
pub fn load_feed(
    config: &BacktestConfig,
    synthetic_bars_per_symbol: Option<usize>,
) -> Result<HistoricBarFeed, RunError> {
    let bt = &config.backtest;
    let bars = match synthetic_bars_per_symbol {
        Some(count) => synthetic_bars(&bt.symbols, bt.start_date, count),
        None => load_csv_dir(&bt.data_dir, &bt.symbols, Some(bt.start_date))?,
    };
    let feed = HistoricBarFeed::new(bt.symbols.clone(), bars)?;
    if feed.is_empty() {
        return Err(RunError::NoBars);
    }
    Ok(feed)
}

/// Assemble a session for a config over a feed.
pub fn build_backtest(config: &BacktestConfig, feed: HistoricBarFeed) -> Result<Backtest, RunError> {
    let backtest = Backtest::builder()
        .data(Box::new(feed))
        .strategy(build_strategy(&config.strategy))
        .execution(Box::new(SimulatedExecutionHandler::from_config(
            &config.execution,
        )))
        .initial_capital(config.backtest.initial_capital)
        .start(config.start_timestamp())
        .heartbeat(config.heartbeat())
        .periods_per_year(config.backtest.periods_per_year)
        .build()?;
    Ok(backtest)
}

/// Run one session over a pre-built feed, reporting to `sink`.
pub fn run_with_feed(
    config: &BacktestConfig,
    feed: HistoricBarFeed,
    sink: &mut dyn ReportSink,
) -> Result<BacktestReport, RunError> {
    let mut backtest = build_backtest(config, feed)?;
    Ok(backtest.simulate_trading(sink)?)
}

/// Load data, run the session and write the configured outputs.
///
/// Outputs land in `{output_dir}/{run_id}/`.
pub fn run_backtest(config: &BacktestConfig, opts: &RunOptions) -> Result<BacktestReport, RunError> {
    config.validate()?;
    let run_id = config.run_id()?;
    let feed = load_feed(config, opts.synthetic_bars)?;
    info!(
        run_id = %run_id,
        bars = feed.len(),
        synthetic = opts.synthetic_bars.is_some(),
        "data ready"
    );

    let base = opts
        .output_dir
        .clone()
        .unwrap_or_else(|| config.output.directory.clone());
    let run_dir = base.join(&run_id);

    let mut sinks: Vec<Box<dyn ReportSink>> = Vec::new();
    if config.output.write_equity_csv {
        sinks.push(Box::new(CsvEquitySink::new(&run_dir)));
    }
    if config.output.write_stats_json {
        sinks.push(Box::new(JsonStatsSink::new(&run_dir).with_run_id(run_id.clone())));
    }

    run_with_feed(config, feed, &mut sinks)
}
