//! Market data provider traits and structured error types.
//!
//! The provider is an external collaborator: the session only needs it to
//! advance one bar set per heartbeat and to answer "latest bar" queries.
//! CSV files, vendor APIs and live feeds all sit behind these two traits.

use std::path::PathBuf;

use thiserror::Error;

use super::bar::{Bar, BarField};
use crate::event::Timestamp;
use crate::queue::{EventSender, QueueClosed};

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("no bars supplied for symbol '{symbol}'")]
    MissingSymbol { symbol: String },

    #[error("symbol list is empty")]
    NoSymbols,

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV in {path}: {message}")]
    Csv { path: PathBuf, message: String },

    #[error("invalid timestamp '{value}' for symbol '{symbol}'")]
    InvalidTimestamp { symbol: String, value: String },

    #[error("data feed failure: {0}")]
    Feed(String),

    #[error(transparent)]
    Queue(#[from] QueueClosed),
}

/// Read-only view of the most recent bars for every tracked symbol.
///
/// Strategies, the portfolio and execution handlers receive this view on
/// every call; none of them can advance the feed.
pub trait MarketData {
    /// Tracked symbols, in session order.
    fn symbols(&self) -> &[String];

    /// Up to `n` most recent bars for a symbol, oldest first.
    fn latest_bars(&self, symbol: &str, n: usize) -> &[Bar];

    /// The most recent bar for a symbol, if the symbol has traded yet.
    fn latest_bar(&self, symbol: &str) -> Option<&Bar> {
        self.latest_bars(symbol, 1).last()
    }

    fn latest_timestamp(&self, symbol: &str) -> Option<Timestamp> {
        self.latest_bar(symbol).map(|bar| bar.timestamp)
    }

    /// Valuation price: the adjusted close of the latest bar.
    fn latest_price(&self, symbol: &str) -> Option<f64> {
        self.latest_field(symbol, BarField::AdjClose)
    }

    fn latest_field(&self, symbol: &str, field: BarField) -> Option<f64> {
        self.latest_bar(symbol).map(|bar| bar.field(field))
    }
}

/// A source of bars that drives the session heartbeat.
pub trait MarketDataProvider: MarketData + Send {
    /// Advance every tracked symbol by one bar and enqueue a `Market` event.
    ///
    /// Returns `Ok(false)` once the data is exhausted; in that case nothing
    /// is enqueued and the session terminates.
    fn update_bars(&mut self, events: &EventSender) -> Result<bool, DataError>;

    /// This provider as a read-only view.
    fn market_data(&self) -> &dyn MarketData;
}
