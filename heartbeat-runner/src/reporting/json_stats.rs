//! Summary statistics export as pretty JSON.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::info;

use heartbeat_core::{BacktestReport, ReportSink, SessionCounters, SinkError, StatsReport};

use super::csv_equity::write_file;

pub const STATS_FILE: &str = "stats.json";

/// The persisted statistics document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsDocument {
    pub run_id: Option<String>,
    pub strategy: String,
    pub symbols: Vec<String>,
    pub initial_capital: f64,
    pub final_total: f64,
    pub stats: StatsReport,
    pub counters: SessionCounters,
}

impl StatsDocument {
    pub fn from_report(report: &BacktestReport, run_id: Option<String>) -> Self {
        Self {
            run_id,
            strategy: report.strategy.clone(),
            symbols: report.symbols.clone(),
            initial_capital: report.initial_capital,
            final_total: report.final_total,
            stats: report.stats_report(),
            counters: report.counters,
        }
    }
}

/// Serialize a report's statistics to pretty JSON.
pub fn stats_json(report: &BacktestReport, run_id: Option<String>) -> Result<String, SinkError> {
    serde_json::to_string_pretty(&StatsDocument::from_report(report, run_id))
        .map_err(|e| SinkError::Encode(e.to_string()))
}

/// Writes `stats.json` into a directory.
#[derive(Debug, Clone)]
pub struct JsonStatsSink {
    dir: PathBuf,
    run_id: Option<String>,
}

impl JsonStatsSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            run_id: None,
        }
    }

    /// Stamp the document with a config run id.
    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(STATS_FILE)
    }
}

impl ReportSink for JsonStatsSink {
    fn write_report(&mut self, report: &BacktestReport) -> Result<(), SinkError> {
        let body = stats_json(report, self.run_id.clone())?;
        write_file(&self.dir, &self.path(), &body)?;
        info!(path = %self.path().display(), "statistics written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heartbeat_core::{EquityCurve, SummaryStats};

    fn report() -> BacktestReport {
        BacktestReport {
            strategy: "buy_and_hold".into(),
            symbols: vec!["SPY".into()],
            initial_capital: 100_000.0,
            final_total: 105_000.0,
            stats: SummaryStats {
                total_return: 0.05,
                sharpe_ratio: 1.25,
                max_drawdown: 0.02,
                drawdown_duration: 4,
            },
            counters: SessionCounters {
                market_events: 10,
                signals: 1,
                orders: 1,
                fills: 1,
            },
            equity_curve: EquityCurve::from_holdings(&["SPY".into()], &[]),
        }
    }

    #[test]
    fn document_uses_display_keys() {
        let json = stats_json(&report(), Some("abc".into())).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["stats"]["Total Return"], "5.00%");
        assert_eq!(value["stats"]["Max Drawdown"], "2.00%");
        assert_eq!(value["stats"]["Drawdown Duration"], 4);
        assert_eq!(value["counters"]["market_events"], 10);
        assert_eq!(value["run_id"], "abc");
    }

    #[test]
    fn sink_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = JsonStatsSink::new(dir.path()).with_run_id("r1");
        sink.write_report(&report()).unwrap();
        let text = std::fs::read_to_string(sink.path()).unwrap();
        let doc: StatsDocument = serde_json::from_str(&text).unwrap();
        assert_eq!(doc.run_id.as_deref(), Some("r1"));
        assert_eq!(doc.counters.fills, 1);
    }
}
