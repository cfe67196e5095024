//! Reporting sinks: CSV equity curve and JSON statistics.
//!
//! Both implement [`ReportSink`](heartbeat_core::ReportSink) and write into
//! a per-run output directory.

pub mod csv_equity;
pub mod json_stats;

pub use csv_equity::{equity_csv, CsvEquitySink, EQUITY_FILE};
pub use json_stats::{stats_json, JsonStatsSink, StatsDocument, STATS_FILE};
