//! Event model: the four event kinds that flow through the session queue.
//!
//! Every event is created by exactly one producer:
//! - `Market` by the data provider, once per heartbeat
//! - `Signal` by the strategy
//! - `Order` by the portfolio
//! - `Fill` by the execution handler
//!
//! Events are moved into the queue and consumed exactly once by the
//! orchestrator's dispatch loop. The set of kinds is closed: adding a kind
//! forces every `match` in the dispatch path to be revisited.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Point in time of a bar, signal or fill.
pub type Timestamp = DateTime<Utc>;

/// A unit of work on the session queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Event {
    Market(MarketEvent),
    Signal(SignalEvent),
    Order(OrderEvent),
    Fill(FillEvent),
}

impl Event {
    /// Short label used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::Market(_) => "MARKET",
            Event::Signal(_) => "SIGNAL",
            Event::Order(_) => "ORDER",
            Event::Fill(_) => "FILL",
        }
    }
}

impl From<MarketEvent> for Event {
    fn from(event: MarketEvent) -> Self {
        Event::Market(event)
    }
}

impl From<SignalEvent> for Event {
    fn from(event: SignalEvent) -> Self {
        Event::Signal(event)
    }
}

impl From<OrderEvent> for Event {
    fn from(event: OrderEvent) -> Self {
        Event::Order(event)
    }
}

impl From<FillEvent> for Event {
    fn from(event: FillEvent) -> Self {
        Event::Fill(event)
    }
}

/// A new bar set is available for every tracked symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketEvent {
    pub timestamp: Timestamp,
}

/// Strategy intent for a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalType {
    Long,
    Short,
    Exit,
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalType::Long => write!(f, "LONG"),
            SignalType::Short => write!(f, "SHORT"),
            SignalType::Exit => write!(f, "EXIT"),
        }
    }
}

/// Emitted by a strategy in response to a market event.
///
/// `strength` is carried for downstream sizing policies; the naive policy
/// ignores it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalEvent {
    pub symbol: String,
    pub timestamp: Timestamp,
    pub signal_type: SignalType,
    pub strength: f64,
}

impl SignalEvent {
    pub fn new(symbol: impl Into<String>, timestamp: Timestamp, signal_type: SignalType) -> Self {
        Self {
            symbol: symbol.into(),
            timestamp,
            signal_type,
            strength: 1.0,
        }
    }
}

/// Order type sent to the execution handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    Market,
    Limit,
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderType::Market => write!(f, "MKT"),
            OrderType::Limit => write!(f, "LMT"),
        }
    }
}

/// Trade direction of an order or fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Buy,
    Sell,
}

impl Direction {
    /// +1 for buys, -1 for sells.
    pub fn sign(self) -> i64 {
        match self {
            Direction::Buy => 1,
            Direction::Sell => -1,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Buy => Direction::Sell,
            Direction::Sell => Direction::Buy,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Buy => write!(f, "BUY"),
            Direction::Sell => write!(f, "SELL"),
        }
    }
}

/// Request to trade `quantity` units of `symbol`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderEvent {
    pub symbol: String,
    pub order_type: OrderType,
    pub quantity: u64,
    pub direction: Direction,
}

impl OrderEvent {
    /// A market order. Quantity must be positive.
    pub fn market(symbol: impl Into<String>, quantity: u64, direction: Direction) -> Self {
        debug_assert!(quantity > 0, "order quantity must be positive");
        Self {
            symbol: symbol.into(),
            order_type: OrderType::Market,
            quantity,
            direction,
        }
    }
}

impl fmt::Display for OrderEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Order: Symbol={}, Type={}, Quantity={}, Direction={}",
            self.symbol, self.order_type, self.quantity, self.direction
        )
    }
}

/// Confirmation that an order traded.
///
/// `fill_cost` is the per-unit price paid or received; the portfolio books
/// this price as-is and never re-derives it from market data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillEvent {
    pub timestamp: Timestamp,
    pub symbol: String,
    pub exchange: String,
    pub quantity: u64,
    pub direction: Direction,
    pub fill_cost: f64,
    pub commission: f64,
}

impl FillEvent {
    /// Signed cash amount of the trade before commission (buys positive).
    pub fn signed_cost(&self) -> f64 {
        self.direction.sign() as f64 * self.fill_cost * self.quantity as f64
    }
}
