//! Per-timestamp position and holdings records.
//!
//! Per-symbol values are stored as vectors indexed in the portfolio's
//! symbol order, resolved once at session start.

use serde::{Deserialize, Serialize};

use crate::event::Timestamp;

/// Cash, cumulative commission, per-symbol market value and account total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holdings {
    pub market_values: Vec<f64>,
    pub cash: f64,
    pub commission: f64,
    pub total: f64,
}

impl Holdings {
    /// Flat account holding only cash.
    pub fn flat(symbol_count: usize, cash: f64) -> Self {
        Self {
            market_values: vec![0.0; symbol_count],
            cash,
            commission: 0.0,
            total: cash,
        }
    }

    /// Sum of per-symbol market values.
    pub fn market_value(&self) -> f64 {
        self.market_values.iter().sum()
    }
}

/// Signed quantities held at a timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionSnapshot {
    pub timestamp: Timestamp,
    pub quantities: Vec<i64>,
}

/// Marked holdings at a timestamp.
///
/// `holdings.total == holdings.cash + sum(holdings.market_values)` holds
/// for every snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingsSnapshot {
    pub timestamp: Timestamp,
    pub holdings: Holdings,
}
