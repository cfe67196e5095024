//! Bar: the fundamental market data unit.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::event::Timestamp;

/// OHLCV bar for a single symbol at a single timestamp.
///
/// Portfolio valuation uses `adj_close`; `close` is the raw traded price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub symbol: String,
    pub timestamp: Timestamp,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    pub adj_close: f64,
}

impl Bar {
    /// Value of a single field.
    pub fn field(&self, field: BarField) -> f64 {
        match field {
            BarField::Open => self.open,
            BarField::High => self.high,
            BarField::Low => self.low,
            BarField::Close => self.close,
            BarField::AdjClose => self.adj_close,
            BarField::Volume => self.volume as f64,
        }
    }

    /// Returns true if any price field is NaN.
    pub fn is_void(&self) -> bool {
        self.open.is_nan()
            || self.high.is_nan()
            || self.low.is_nan()
            || self.close.is_nan()
            || self.adj_close.is_nan()
    }

    /// Basic OHLC sanity check: high >= low, high >= open, high >= close, etc.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open > 0.0
            && self.close > 0.0
    }
}

/// Named bar column, for `latest_field` lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarField {
    Open,
    High,
    Low,
    Close,
    AdjClose,
    Volume,
}

impl fmt::Display for BarField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BarField::Open => "open",
            BarField::High => "high",
            BarField::Low => "low",
            BarField::Close => "close",
            BarField::AdjClose => "adj_close",
            BarField::Volume => "volume",
        };
        f.write_str(name)
    }
}

impl FromStr for BarField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(' ', "_").as_str() {
            "open" => Ok(BarField::Open),
            "high" => Ok(BarField::High),
            "low" => Ok(BarField::Low),
            "close" => Ok(BarField::Close),
            "adj_close" | "adjclose" => Ok(BarField::AdjClose),
            "volume" => Ok(BarField::Volume),
            other => Err(format!("unknown bar field '{other}'")),
        }
    }
}
