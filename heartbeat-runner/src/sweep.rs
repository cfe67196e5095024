//! Parameter sweeps for the moving average crossover.
//!
//! Every parameter pair runs as its own single-threaded session over a
//! clone of the same feed; sessions run in parallel on the rayon pool.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use heartbeat_core::{HistoricBarFeed, SessionCounters, SummaryStats};

use crate::config::{BacktestConfig, StrategyConfig};
use crate::runner::{build_backtest, RunError};

/// One crossover parameter pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepPoint {
    pub short_window: usize,
    pub long_window: usize,
}

/// Outcome of one sweep session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepResult {
    pub point: SweepPoint,
    pub stats: SummaryStats,
    pub counters: SessionCounters,
    pub final_total: f64,
}

/// Cartesian product of windows, skipping pairs with `short >= long`.
pub fn sweep_grid(shorts: &[usize], longs: &[usize]) -> Vec<SweepPoint> {
    let mut points = Vec::with_capacity(shorts.len() * longs.len());
    for &short_window in shorts {
        for &long_window in longs {
            if short_window == 0 || short_window >= long_window {
                continue;
            }
            points.push(SweepPoint {
                short_window,
                long_window,
            });
        }
    }
    points
}

/// Run one session per point. Results come back in input order.
pub fn run_sweep(
    base: &BacktestConfig,
    feed: &HistoricBarFeed,
    points: &[SweepPoint],
) -> Result<Vec<SweepResult>, RunError> {
    points
        .par_iter()
        .map(|&point| -> Result<SweepResult, RunError> {
            let mut config = base.clone();
            config.strategy = StrategyConfig::MovingAverageCross {
                short_window: point.short_window,
                long_window: point.long_window,
            };
            config.validate()?;

            let mut backtest = build_backtest(&config, feed.clone())?;
            let counters = backtest.run()?;
            let report = backtest.report();
            Ok(SweepResult {
                point,
                stats: report.stats,
                counters,
                final_total: report.final_total,
            })
        })
        .collect()
}
