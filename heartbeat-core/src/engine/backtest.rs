//! Heartbeat orchestrator: owns the queue and drives the dispatch loop.
//!
//! Two nested loops:
//! 1. Heartbeat: advance the data provider by one bar set, drain the queue,
//!    then sleep for the configured heartbeat.
//! 2. Drain: pop events FIFO until the queue is empty, dispatching each by
//!    kind. Events enqueued during a dispatch are handled in the same drain.
//!
//! The session ends when the provider reports exhaustion or a shutdown is
//! requested. Any collaborator error aborts the session immediately.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use super::report::{BacktestReport, ReportSink, SinkError};
use crate::data::{DataError, MarketDataProvider};
use crate::event::{Event, Timestamp};
use crate::execution::{ExecutionError, ExecutionHandler};
use crate::portfolio::{Portfolio, PortfolioError};
use crate::queue::{EventQueue, EventSender};
use crate::strategy::{Strategy, StrategyError};

/// Default annualization factor for daily bars.
pub const DEFAULT_PERIODS_PER_YEAR: u32 = 252;

/// Default starting capital.
pub const DEFAULT_INITIAL_CAPITAL: f64 = 100_000.0;

/// Session abort reasons.
#[derive(Debug, Error)]
pub enum BacktestError {
    #[error("data provider failed: {0}")]
    Data(#[from] DataError),

    #[error("strategy failed: {0}")]
    Strategy(#[from] StrategyError),

    #[error("execution failed: {0}")]
    Execution(#[from] ExecutionError),

    #[error("portfolio rejected event: {0}")]
    Portfolio(#[from] PortfolioError),

    #[error("report sink failed: {0}")]
    Sink(#[from] SinkError),

    #[error("backtest builder is missing the {0}")]
    MissingComponent(&'static str),

    #[error("initial capital must be positive, got {0}")]
    InvalidCapital(f64),
}

/// Number of events dispatched per kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCounters {
    pub market_events: u64,
    pub signals: u64,
    pub orders: u64,
    pub fills: u64,
}

/// Cross-thread request to stop a running session.
///
/// The loop checks the flag between heartbeats, after a full drain, so a
/// stop never leaves an event half-processed.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle(Arc<AtomicBool>);

impl ShutdownHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// One simulation session.
pub struct Backtest {
    data: Box<dyn MarketDataProvider>,
    strategy: Box<dyn Strategy>,
    execution: Box<dyn ExecutionHandler>,
    portfolio: Portfolio,
    queue: EventQueue,
    heartbeat: Duration,
    periods_per_year: u32,
    counters: SessionCounters,
    shutdown: ShutdownHandle,
}

impl Backtest {
    pub fn builder() -> BacktestBuilder {
        BacktestBuilder::default()
    }

    /// A producer handle onto this session's queue.
    pub fn sender(&self) -> EventSender {
        self.queue.sender()
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    pub fn counters(&self) -> SessionCounters {
        self.counters
    }

    pub fn periods_per_year(&self) -> u32 {
        self.periods_per_year
    }

    /// Run the heartbeat loop to completion.
    pub fn run(&mut self) -> Result<SessionCounters, BacktestError> {
        info!(
            strategy = self.strategy.name(),
            symbols = ?self.portfolio.symbols(),
            initial_capital = self.portfolio.initial_capital(),
            heartbeat_ms = self.heartbeat.as_millis() as u64,
            "session started"
        );

        let sender = self.queue.sender();
        let mut heartbeats: u64 = 0;
        loop {
            if self.shutdown.is_requested() {
                info!(heartbeats, "shutdown requested, stopping session");
                break;
            }
            if !self.data.update_bars(&sender)? {
                break;
            }
            heartbeats += 1;
            self.drain(&sender)?;
            debug!(heartbeats, "heartbeat complete");

            if !self.heartbeat.is_zero() {
                thread::sleep(self.heartbeat);
            }
        }

        // Fills handed off asynchronously after the last bar still count.
        self.drain(&sender)?;

        info!(
            market_events = self.counters.market_events,
            signals = self.counters.signals,
            orders = self.counters.orders,
            fills = self.counters.fills,
            "session finished"
        );
        Ok(self.counters)
    }

    /// Pop and dispatch until the queue is empty.
    fn drain(&mut self, sender: &EventSender) -> Result<(), BacktestError> {
        while let Some(event) = self.queue.pop() {
            self.dispatch(event, sender)?;
        }
        Ok(())
    }

    fn dispatch(&mut self, event: Event, sender: &EventSender) -> Result<(), BacktestError> {
        debug!(kind = event.kind(), "dispatch");
        match event {
            Event::Market(market) => {
                // The strategy sees the tick before holdings are re-marked.
                self.strategy
                    .calculate_signals(&market, self.data.market_data(), sender)?;
                self.portfolio
                    .update_timeindex(&market, self.data.market_data());
                self.counters.market_events += 1;
            }
            Event::Signal(signal) => {
                self.portfolio.update_signal(&signal, sender)?;
                self.counters.signals += 1;
            }
            Event::Order(order) => {
                self.execution
                    .execute_order(&order, self.data.market_data(), sender)?;
                self.counters.orders += 1;
            }
            Event::Fill(fill) => {
                self.portfolio.update_fill(&fill)?;
                self.counters.fills += 1;
            }
        }
        Ok(())
    }

    /// Statistics and equity curve of the session so far.
    pub fn report(&self) -> BacktestReport {
        let equity_curve = self.portfolio.create_equity_curve();
        let stats = equity_curve.summary_stats(self.periods_per_year);
        BacktestReport {
            strategy: self.strategy.name().to_string(),
            symbols: self.portfolio.symbols().to_vec(),
            initial_capital: self.portfolio.initial_capital(),
            final_total: self.portfolio.current_holdings().total,
            stats,
            counters: self.counters,
            equity_curve,
        }
    }

    /// Run the session, then hand the report to `sink`.
    pub fn simulate_trading(
        &mut self,
        sink: &mut dyn ReportSink,
    ) -> Result<BacktestReport, BacktestError> {
        self.run()?;
        let report = self.report();
        let stats = report.stats_report();
        info!(
            total_return = %stats.total_return,
            sharpe_ratio = stats.sharpe_ratio,
            max_drawdown = %stats.max_drawdown,
            drawdown_duration = stats.drawdown_duration,
            "summary"
        );
        sink.write_report(&report)?;
        Ok(report)
    }
}

/// Assembles a [`Backtest`] from boxed collaborators.
pub struct BacktestBuilder {
    data: Option<Box<dyn MarketDataProvider>>,
    strategy: Option<Box<dyn Strategy>>,
    execution: Option<Box<dyn ExecutionHandler>>,
    initial_capital: f64,
    start: Option<Timestamp>,
    heartbeat: Duration,
    periods_per_year: u32,
    queue: Option<EventQueue>,
    shutdown: Option<ShutdownHandle>,
}

impl Default for BacktestBuilder {
    fn default() -> Self {
        Self {
            data: None,
            strategy: None,
            execution: None,
            initial_capital: DEFAULT_INITIAL_CAPITAL,
            start: None,
            heartbeat: Duration::ZERO,
            periods_per_year: DEFAULT_PERIODS_PER_YEAR,
            queue: None,
            shutdown: None,
        }
    }
}

impl BacktestBuilder {
    pub fn data(mut self, data: Box<dyn MarketDataProvider>) -> Self {
        self.data = Some(data);
        self
    }

    pub fn strategy(mut self, strategy: Box<dyn Strategy>) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn execution(mut self, execution: Box<dyn ExecutionHandler>) -> Self {
        self.execution = Some(execution);
        self
    }

    pub fn initial_capital(mut self, capital: f64) -> Self {
        self.initial_capital = capital;
        self
    }

    /// Timestamp of the seed position and holdings snapshots.
    pub fn start(mut self, start: Timestamp) -> Self {
        self.start = Some(start);
        self
    }

    /// Pause between heartbeats; zero for historical replay.
    pub fn heartbeat(mut self, heartbeat: Duration) -> Self {
        self.heartbeat = heartbeat;
        self
    }

    pub fn periods_per_year(mut self, periods: u32) -> Self {
        self.periods_per_year = periods;
        self
    }

    /// Use an existing queue, e.g. one whose sender was already handed to a
    /// broker callback.
    pub fn queue(mut self, queue: EventQueue) -> Self {
        self.queue = Some(queue);
        self
    }

    pub fn shutdown(mut self, shutdown: ShutdownHandle) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    pub fn build(self) -> Result<Backtest, BacktestError> {
        let data = self.data.ok_or(BacktestError::MissingComponent("data provider"))?;
        let strategy = self.strategy.ok_or(BacktestError::MissingComponent("strategy"))?;
        let execution = self
            .execution
            .ok_or(BacktestError::MissingComponent("execution handler"))?;
        let start = self.start.ok_or(BacktestError::MissingComponent("start timestamp"))?;
        if self.initial_capital.is_nan() || self.initial_capital <= 0.0 {
            return Err(BacktestError::InvalidCapital(self.initial_capital));
        }

        let portfolio = Portfolio::new(data.symbols().to_vec(), self.initial_capital, start);
        Ok(Backtest {
            data,
            strategy,
            execution,
            portfolio,
            queue: self.queue.unwrap_or_default(),
            heartbeat: self.heartbeat,
            periods_per_year: self.periods_per_year,
            counters: SessionCounters::default(),
            shutdown: self.shutdown.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Bar, HistoricBarFeed, MarketData};
    use crate::event::{MarketEvent, OrderEvent};
    use chrono::{TimeZone, Utc};
    use std::collections::HashMap;

    struct Idle;

    impl Strategy for Idle {
        fn name(&self) -> &str {
            "idle"
        }

        fn calculate_signals(
            &mut self,
            _: &MarketEvent,
            _: &dyn MarketData,
            _: &EventSender,
        ) -> Result<(), StrategyError> {
            Ok(())
        }
    }

    struct NoFills;

    impl ExecutionHandler for NoFills {
        fn execute_order(
            &mut self,
            _: &OrderEvent,
            _: &dyn MarketData,
            _: &EventSender,
        ) -> Result<(), ExecutionError> {
            Ok(())
        }
    }

    fn feed(n: usize) -> HistoricBarFeed {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let bars = (0..n)
            .map(|i| Bar {
                symbol: "X".into(),
                timestamp: start + chrono::Duration::days(i as i64),
                open: 10.0,
                high: 10.0,
                low: 10.0,
                close: 10.0,
                volume: 100,
                adj_close: 10.0,
            })
            .collect();
        let mut by_symbol = HashMap::new();
        by_symbol.insert("X".to_string(), bars);
        HistoricBarFeed::new(vec!["X".into()], by_symbol).unwrap()
    }

    fn builder(n: usize) -> BacktestBuilder {
        Backtest::builder()
            .data(Box::new(feed(n)))
            .strategy(Box::new(Idle))
            .execution(Box::new(NoFills))
            .start(Utc.with_ymd_and_hms(2023, 12, 31, 0, 0, 0).unwrap())
    }

    #[test]
    fn builder_requires_components() {
        let err = Backtest::builder().build().err().unwrap();
        assert!(matches!(err, BacktestError::MissingComponent("data provider")));

        let err = Backtest::builder()
            .data(Box::new(feed(1)))
            .strategy(Box::new(Idle))
            .execution(Box::new(NoFills))
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, BacktestError::MissingComponent("start timestamp")));
    }

    #[test]
    fn builder_rejects_non_positive_capital() {
        let err = builder(1).initial_capital(0.0).build().err().unwrap();
        assert!(matches!(err, BacktestError::InvalidCapital(_)));
    }

    #[test]
    fn run_counts_market_events() {
        let mut bt = builder(4).build().unwrap();
        let counters = bt.run().unwrap();
        assert_eq!(counters.market_events, 4);
        assert_eq!(counters.signals, 0);
        assert_eq!(bt.portfolio().holdings_history().len(), 5);
    }

    #[test]
    fn shutdown_before_run_processes_nothing() {
        let shutdown = ShutdownHandle::new();
        let mut bt = builder(3).shutdown(shutdown.clone()).build().unwrap();
        shutdown.request();
        assert_eq!(bt.run().unwrap().market_events, 0);
        assert!(bt.shutdown_handle().is_requested());
    }

    #[test]
    fn report_reflects_flat_session() {
        let mut bt = builder(3).build().unwrap();
        bt.run().unwrap();
        let report = bt.report();
        assert_eq!(report.strategy, "idle");
        assert_eq!(report.final_total, DEFAULT_INITIAL_CAPITAL);
        assert_eq!(report.stats.total_return, 0.0);
        assert_eq!(report.equity_curve.len(), 4);
    }
}
