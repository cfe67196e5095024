//! Session report and the reporting sink seam.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::backtest::SessionCounters;
use crate::performance::{StatsReport, SummaryStats};
use crate::portfolio::EquityCurve;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode report: {0}")]
    Encode(String),
}

/// Final statistics plus the full equity curve of one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestReport {
    pub strategy: String,
    pub symbols: Vec<String>,
    pub initial_capital: f64,
    pub final_total: f64,
    pub stats: SummaryStats,
    pub counters: SessionCounters,
    pub equity_curve: EquityCurve,
}

impl BacktestReport {
    /// The `"Total Return" / "Sharpe Ratio" / ...` display mapping.
    pub fn stats_report(&self) -> StatsReport {
        self.stats.report()
    }
}

/// Destination for a finished session's report.
pub trait ReportSink {
    fn write_report(&mut self, report: &BacktestReport) -> Result<(), SinkError>;
}

/// Keeps reports in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub reports: Vec<BacktestReport>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<&BacktestReport> {
        self.reports.last()
    }
}

impl ReportSink for MemorySink {
    fn write_report(&mut self, report: &BacktestReport) -> Result<(), SinkError> {
        self.reports.push(report.clone());
        Ok(())
    }
}

/// Fan a report out to several sinks, in order.
impl ReportSink for Vec<Box<dyn ReportSink>> {
    fn write_report(&mut self, report: &BacktestReport) -> Result<(), SinkError> {
        for sink in self.iter_mut() {
            sink.write_report(report)?;
        }
        Ok(())
    }
}
