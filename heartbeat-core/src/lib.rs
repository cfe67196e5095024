//! Heartbeat Core: event-driven backtesting engine.
//!
//! This crate contains the simulation core:
//! - Event model (Market, Signal, Order, Fill) and the session queue
//! - Capability traits for market data, strategies and execution
//! - Portfolio bookkeeping with naive fixed-quantity order sizing
//! - Equity curve, Sharpe ratio and drawdown statistics
//! - The heartbeat orchestrator and its report sink seam
//! - Broker fill hand-off for asynchronous execution adapters
//!
//! No file or network I/O happens here; concrete feeds, strategies,
//! execution handlers and sinks live in `heartbeat-runner`.

pub mod broker;
pub mod data;
pub mod engine;
pub mod event;
pub mod execution;
pub mod performance;
pub mod portfolio;
pub mod queue;
pub mod strategy;

pub use data::{Bar, BarField, DataError, HistoricBarFeed, MarketData, MarketDataProvider};
pub use engine::{
    Backtest, BacktestBuilder, BacktestError, BacktestReport, MemorySink, ReportSink,
    SessionCounters, ShutdownHandle, SinkError,
};
pub use event::{
    Direction, Event, FillEvent, MarketEvent, OrderEvent, OrderType, SignalEvent, SignalType,
    Timestamp,
};
pub use execution::{ExecutionError, ExecutionHandler};
pub use performance::{drawdowns, sharpe_ratio, Drawdowns, StatsReport, SummaryStats};
pub use portfolio::{EquityCurve, EquityPoint, Portfolio, PortfolioError};
pub use queue::{EventQueue, EventSender, QueueClosed};
pub use strategy::{Strategy, StrategyError};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: events, reports and queue handles cross threads.
    ///
    /// Broker callbacks push fills from their own thread and sweeps move
    /// reports out of rayon workers.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Events
        require_send::<Event>();
        require_sync::<Event>();
        require_send::<FillEvent>();
        require_sync::<FillEvent>();
        require_send::<OrderEvent>();
        require_sync::<OrderEvent>();

        // Queue and control handles
        require_send::<EventSender>();
        require_send::<ShutdownHandle>();
        require_sync::<ShutdownHandle>();
        require_send::<broker::FillRouter>();
        require_sync::<broker::FillRouter>();

        // Reports
        require_send::<BacktestReport>();
        require_sync::<BacktestReport>();
        require_send::<Portfolio>();
        require_sync::<Portfolio>();
        require_send::<Bar>();
        require_sync::<Bar>();

        // Sessions can be moved onto a worker thread
        require_send::<Backtest>();
    }
}
