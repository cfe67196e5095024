//! Heartbeat Runner: concrete collaborators and session wiring.
//!
//! This crate builds on `heartbeat-core` to provide:
//! - TOML configuration with validation and content-addressed run ids
//! - CSV bar loading and deterministic synthetic bars
//! - Buy-and-hold and moving average crossover strategies
//! - Simulated fill-at-close execution with commission models
//! - CSV equity curve and JSON statistics sinks
//! - Parallel parameter sweeps

pub mod config;
pub mod data_loader;
pub mod execution;
pub mod reporting;
pub mod runner;
pub mod strategies;
pub mod sweep;

pub use config::{
    BacktestConfig, BacktestSection, CommissionConfig, ConfigError, ExecutionConfig, OutputConfig,
    RunId, StrategyConfig,
};
pub use data_loader::{generate_synthetic_bars, load_csv_bars, load_csv_dir};
pub use execution::{commission, SimulatedExecutionHandler};
pub use reporting::{CsvEquitySink, JsonStatsSink, StatsDocument};
pub use runner::{build_backtest, load_feed, run_backtest, run_with_feed, RunError, RunOptions};
pub use strategies::{build_strategy, BuyAndHoldStrategy, MovingAverageCrossStrategy};
pub use sweep::{run_sweep, sweep_grid, SweepPoint, SweepResult};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn config_is_send_sync() {
        assert_send::<BacktestConfig>();
        assert_sync::<BacktestConfig>();
    }

    #[test]
    fn sweep_result_is_send_sync() {
        assert_send::<SweepResult>();
        assert_sync::<SweepResult>();
    }

    #[test]
    fn collaborators_are_send() {
        assert_send::<SimulatedExecutionHandler>();
        assert_send::<BuyAndHoldStrategy>();
        assert_send::<MovingAverageCrossStrategy>();
    }
}
