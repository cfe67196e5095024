//! Simulated execution: every order fills immediately at the latest price.
//!
//! The fill price is the same adjusted close the portfolio marks holdings
//! at. No latency, slippage or partial fills. The fill is stamped with the
//! latest bar time and the configured exchange label, and carries the
//! commission computed by the configured model.

use tracing::debug;

use heartbeat_core::{
    EventSender, ExecutionError, ExecutionHandler, FillEvent, MarketData, OrderEvent,
};

use crate::config::{CommissionConfig, ExecutionConfig};

/// Minimum commission per order under the tiered schedule.
const TIERED_MINIMUM: f64 = 1.30;
/// Per-share rate up to and including `TIERED_SMALL_ORDER` shares.
const TIERED_SMALL_RATE: f64 = 0.013;
/// Per-share rate above `TIERED_SMALL_ORDER` shares.
const TIERED_LARGE_RATE: f64 = 0.008;
const TIERED_SMALL_ORDER: u64 = 500;
/// Commission never exceeds this fraction of trade value.
const TIERED_CAP_FRACTION: f64 = 0.005;

/// Commission for a fill of `quantity` shares at `price`.
pub fn commission(model: &CommissionConfig, quantity: u64, price: f64) -> f64 {
    let q = quantity as f64;
    match *model {
        CommissionConfig::None => 0.0,
        CommissionConfig::PerTrade { amount } => amount,
        CommissionConfig::PerShare { amount } => amount * q,
        CommissionConfig::Tiered => {
            let rate = if quantity <= TIERED_SMALL_ORDER {
                TIERED_SMALL_RATE
            } else {
                TIERED_LARGE_RATE
            };
            let full = TIERED_MINIMUM.max(rate * q);
            full.min(TIERED_CAP_FRACTION * q * price)
        }
    }
}

/// Fill-at-last-price execution handler for historical sessions.
#[derive(Debug, Clone)]
pub struct SimulatedExecutionHandler {
    exchange: String,
    commission: CommissionConfig,
}

impl SimulatedExecutionHandler {
    pub fn new(exchange: impl Into<String>, commission: CommissionConfig) -> Self {
        Self {
            exchange: exchange.into(),
            commission,
        }
    }

    pub fn from_config(config: &ExecutionConfig) -> Self {
        Self::new(config.exchange.clone(), config.commission.clone())
    }
}

impl ExecutionHandler for SimulatedExecutionHandler {
    fn execute_order(
        &mut self,
        order: &OrderEvent,
        data: &dyn MarketData,
        events: &EventSender,
    ) -> Result<(), ExecutionError> {
        let (timestamp, price) = match (
            data.latest_timestamp(&order.symbol),
            data.latest_price(&order.symbol),
        ) {
            (Some(timestamp), Some(price)) => (timestamp, price),
            _ => {
                return Err(ExecutionError::NoPrice {
                    symbol: order.symbol.clone(),
                })
            }
        };
        let fee = commission(&self.commission, order.quantity, price);

        debug!(%order, price, commission = fee, "simulated fill");
        events.push(FillEvent {
            timestamp,
            symbol: order.symbol.clone(),
            exchange: self.exchange.clone(),
            quantity: order.quantity,
            direction: order.direction,
            fill_cost: price,
            commission: fee,
        })?;
        Ok(())
    }
}
