//! Equity curve export as CSV.
//!
//! Columns: `datetime`, one market-value column per symbol in session
//! order, then `cash, commission, total, returns, equity_curve, drawdown`.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use heartbeat_core::{BacktestReport, EquityCurve, ReportSink, SinkError};

pub const EQUITY_FILE: &str = "equity.csv";

/// Render an equity curve as CSV text.
pub fn equity_csv(curve: &EquityCurve) -> Result<String, SinkError> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header = vec!["datetime".to_string()];
    header.extend(curve.symbols().iter().cloned());
    header.extend(
        ["cash", "commission", "total", "returns", "equity_curve", "drawdown"]
            .iter()
            .map(|s| s.to_string()),
    );
    wtr.write_record(&header).map_err(encode_err)?;

    for point in curve.points() {
        let mut row = Vec::with_capacity(header.len());
        row.push(point.timestamp.to_rfc3339());
        row.extend(point.market_values.iter().map(|v| format!("{v:.4}")));
        row.push(format!("{:.4}", point.cash));
        row.push(format!("{:.4}", point.commission));
        row.push(format!("{:.4}", point.total));
        row.push(format!("{:.8}", point.returns));
        row.push(format!("{:.8}", point.equity_curve));
        row.push(format!("{:.8}", point.drawdown));
        wtr.write_record(&row).map_err(encode_err)?;
    }

    let bytes = wtr.into_inner().map_err(|e| SinkError::Encode(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| SinkError::Encode(e.to_string()))
}

fn encode_err(e: csv::Error) -> SinkError {
    SinkError::Encode(e.to_string())
}

/// Writes `equity.csv` into a directory.
#[derive(Debug, Clone)]
pub struct CsvEquitySink {
    dir: PathBuf,
}

impl CsvEquitySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(EQUITY_FILE)
    }
}

impl ReportSink for CsvEquitySink {
    fn write_report(&mut self, report: &BacktestReport) -> Result<(), SinkError> {
        let body = equity_csv(&report.equity_curve)?;
        write_file(&self.dir, &self.path(), &body)?;
        info!(path = %self.path().display(), rows = report.equity_curve.len(), "equity curve written");
        Ok(())
    }
}

/// Create `dir` if needed and write `body` to `path`.
pub(crate) fn write_file(dir: &Path, path: &Path, body: &str) -> Result<(), SinkError> {
    fs::create_dir_all(dir).map_err(|source| SinkError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    fs::write(path, body).map_err(|source| SinkError::Io {
        path: path.to_path_buf(),
        source,
    })
}
