//! Session orchestration: the heartbeat loop, its builder and reporting.

pub mod backtest;
pub mod report;

pub use backtest::{
    Backtest, BacktestBuilder, BacktestError, SessionCounters, ShutdownHandle,
    DEFAULT_INITIAL_CAPITAL, DEFAULT_PERIODS_PER_YEAR,
};
pub use report::{BacktestReport, MemorySink, ReportSink, SinkError};
