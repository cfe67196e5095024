//! Portfolio: positions, holdings and the equity time series.
//!
//! The portfolio is the single writer of account state within a session.
//! It reacts to three events:
//! - `Market`: append a position snapshot and a freshly marked holdings
//!   snapshot (`update_timeindex`)
//! - `Signal`: size an order with the naive policy and enqueue it
//!   (`update_signal`)
//! - `Fill`: book quantity, then cost and commission (`update_fill`)
//!
//! Account identity for every holdings snapshot:
//! `total == cash + sum(position[s] * last_price[s])`.

pub mod equity;
pub mod sizing;
pub mod snapshot;

use std::collections::HashMap;

use thiserror::Error;
use tracing::{debug, trace};

use crate::data::MarketData;
use crate::event::{FillEvent, MarketEvent, OrderEvent, SignalEvent, Timestamp};
use crate::performance::SummaryStats;
use crate::queue::{EventSender, QueueClosed};

pub use equity::{EquityCurve, EquityPoint};
pub use sizing::{naive_order, NAIVE_ORDER_QUANTITY};
pub use snapshot::{Holdings, HoldingsSnapshot, PositionSnapshot};

#[derive(Debug, Error)]
pub enum PortfolioError {
    #[error("symbol '{0}' is not tracked by this portfolio")]
    UnknownSymbol(String),

    #[error(transparent)]
    Queue(#[from] QueueClosed),
}

/// Position and holdings bookkeeping for one session.
#[derive(Debug, Clone)]
pub struct Portfolio {
    symbols: Vec<String>,
    index: HashMap<String, usize>,
    initial_capital: f64,
    current_positions: Vec<i64>,
    current_holdings: Holdings,
    /// Last valuation price seen per symbol, for symbols without a bar yet.
    last_prices: Vec<f64>,
    all_positions: Vec<PositionSnapshot>,
    all_holdings: Vec<HoldingsSnapshot>,
}

impl Portfolio {
    /// A flat portfolio seeded with one snapshot at `start`.
    pub fn new(symbols: Vec<String>, initial_capital: f64, start: Timestamp) -> Self {
        let index = symbols
            .iter()
            .enumerate()
            .map(|(i, s)| (s.clone(), i))
            .collect();
        let n = symbols.len();
        let current_holdings = Holdings::flat(n, initial_capital);

        Self {
            all_positions: vec![PositionSnapshot {
                timestamp: start,
                quantities: vec![0; n],
            }],
            all_holdings: vec![HoldingsSnapshot {
                timestamp: start,
                holdings: current_holdings.clone(),
            }],
            symbols,
            index,
            initial_capital,
            current_positions: vec![0; n],
            current_holdings,
            last_prices: vec![0.0; n],
        }
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn initial_capital(&self) -> f64 {
        self.initial_capital
    }

    /// Signed quantity currently held (0 for untracked symbols).
    pub fn current_position(&self, symbol: &str) -> i64 {
        self.index
            .get(symbol)
            .map_or(0, |&i| self.current_positions[i])
    }

    /// Current market value booked for a symbol (0.0 for untracked symbols).
    pub fn current_market_value(&self, symbol: &str) -> f64 {
        self.index
            .get(symbol)
            .map_or(0.0, |&i| self.current_holdings.market_values[i])
    }

    pub fn current_holdings(&self) -> &Holdings {
        &self.current_holdings
    }

    /// Position snapshots, one per processed market event plus the seed.
    pub fn positions_history(&self) -> &[PositionSnapshot] {
        &self.all_positions
    }

    /// Holdings snapshots, one per processed market event plus the seed.
    pub fn holdings_history(&self) -> &[HoldingsSnapshot] {
        &self.all_holdings
    }

    fn symbol_index(&self, symbol: &str) -> Result<usize, PortfolioError> {
        self.index
            .get(symbol)
            .copied()
            .ok_or_else(|| PortfolioError::UnknownSymbol(symbol.to_string()))
    }

    /// Append position and holdings snapshots for a new market tick.
    ///
    /// Each symbol is marked at its latest adjusted close; a symbol without
    /// a bar yet keeps its last known price. The current holdings take the
    /// freshly marked values.
    pub fn update_timeindex(&mut self, event: &MarketEvent, data: &dyn MarketData) {
        let timestamp = event.timestamp;

        self.all_positions.push(PositionSnapshot {
            timestamp,
            quantities: self.current_positions.clone(),
        });

        let mut holdings = Holdings {
            market_values: vec![0.0; self.symbols.len()],
            cash: self.current_holdings.cash,
            commission: self.current_holdings.commission,
            total: self.current_holdings.cash,
        };
        for (i, symbol) in self.symbols.iter().enumerate() {
            if let Some(price) = data.latest_price(symbol) {
                self.last_prices[i] = price;
            }
            let market_value = self.current_positions[i] as f64 * self.last_prices[i];
            holdings.market_values[i] = market_value;
            holdings.total += market_value;
        }

        trace!(%timestamp, total = holdings.total, "holdings marked");
        self.current_holdings.market_values = holdings.market_values.clone();
        self.current_holdings.total = holdings.total;
        self.all_holdings.push(HoldingsSnapshot {
            timestamp,
            holdings,
        });
    }

    /// Size the signal with the naive policy.
    pub fn generate_naive_order(
        &self,
        signal: &SignalEvent,
    ) -> Result<Option<OrderEvent>, PortfolioError> {
        let i = self.symbol_index(&signal.symbol)?;
        Ok(naive_order(signal, self.current_positions[i]))
    }

    /// Convert a signal into an order and enqueue it, if the policy sizes one.
    pub fn update_signal(
        &mut self,
        signal: &SignalEvent,
        events: &EventSender,
    ) -> Result<(), PortfolioError> {
        match self.generate_naive_order(signal)? {
            Some(order) => {
                debug!(%order, "order generated");
                events.push(order)?;
            }
            None => debug!(
                symbol = %signal.symbol,
                signal = %signal.signal_type,
                "signal produced no order"
            ),
        }
        Ok(())
    }

    /// Book a fill: positions first, then holdings.
    pub fn update_fill(&mut self, fill: &FillEvent) -> Result<(), PortfolioError> {
        let i = self.symbol_index(&fill.symbol)?;
        self.update_positions_from_fill(i, fill);
        self.update_holdings_from_fill(i, fill);
        debug!(
            symbol = %fill.symbol,
            direction = %fill.direction,
            quantity = fill.quantity,
            cash = self.current_holdings.cash,
            "fill booked"
        );
        Ok(())
    }

    fn update_positions_from_fill(&mut self, i: usize, fill: &FillEvent) {
        self.current_positions[i] += fill.direction.sign() * fill.quantity as i64;
    }

    fn update_holdings_from_fill(&mut self, i: usize, fill: &FillEvent) {
        let cost = fill.signed_cost();
        let holdings = &mut self.current_holdings;
        holdings.market_values[i] += cost;
        holdings.commission += fill.commission;
        holdings.cash -= cost + fill.commission;
        holdings.total -= cost + fill.commission;
    }

    /// The equity curve over all holdings snapshots.
    pub fn create_equity_curve(&self) -> EquityCurve {
        EquityCurve::from_holdings(&self.symbols, &self.all_holdings)
    }

    /// Total return, Sharpe ratio, max drawdown and drawdown duration.
    pub fn summary_stats(&self, periods_per_year: u32) -> SummaryStats {
        self.create_equity_curve().summary_stats(periods_per_year)
    }
}
