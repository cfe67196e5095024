//! Broker hand-off for live execution adapters.
//!
//! Real brokers confirm fills asynchronously, usually on their own
//! notification thread. `BrokerExecutionHandler` places orders through a
//! [`BrokerClient`] and registers each one with a [`FillRouter`]; the
//! broker's callback feeds status reports to the router, which turns the
//! first "filled" report per order into a `Fill` event on the session queue.
//! Duplicate "filled" reports are common and never produce a second fill.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::data::MarketData;
use crate::event::{Direction, FillEvent, OrderEvent, Timestamp};
use crate::execution::{ExecutionError, ExecutionHandler};
use crate::queue::EventSender;

/// Transport to an external broker.
pub trait BrokerClient: Send {
    /// Submit an order under the session-assigned `order_id`.
    fn place_order(&mut self, order_id: u64, order: &OrderEvent) -> Result<(), ExecutionError>;
}

/// Broker-side order state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BrokerOrderStatus {
    Submitted,
    PartiallyFilled,
    Filled,
    Cancelled,
}

/// A status notification from the broker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderStatusReport {
    pub order_id: u64,
    pub status: BrokerOrderStatus,
    /// Cumulative filled quantity.
    pub filled_quantity: u64,
    pub avg_fill_price: f64,
    pub commission: f64,
    pub timestamp: Timestamp,
}

#[derive(Debug, Clone)]
struct OpenOrder {
    symbol: String,
    exchange: String,
    direction: Direction,
    filled: bool,
}

/// Converts broker status reports into fill events. Shareable across threads.
#[derive(Debug, Clone)]
pub struct FillRouter {
    orders: Arc<Mutex<HashMap<u64, OpenOrder>>>,
    events: EventSender,
}

impl FillRouter {
    pub fn new(events: EventSender) -> Self {
        Self {
            orders: Arc::new(Mutex::new(HashMap::new())),
            events,
        }
    }

    /// Track an order before it is sent to the broker.
    pub fn register(
        &self,
        order_id: u64,
        order: &OrderEvent,
        exchange: &str,
    ) -> Result<(), ExecutionError> {
        let mut orders = self
            .orders
            .lock()
            .map_err(|_| ExecutionError::RouterPoisoned)?;
        orders.entry(order_id).or_insert_with(|| OpenOrder {
            symbol: order.symbol.clone(),
            exchange: exchange.to_string(),
            direction: order.direction,
            filled: false,
        });
        Ok(())
    }

    /// Handle one broker status report.
    ///
    /// Returns `Ok(true)` when a fill event was enqueued.
    pub fn on_order_status(&self, report: &OrderStatusReport) -> Result<bool, ExecutionError> {
        let mut orders = self
            .orders
            .lock()
            .map_err(|_| ExecutionError::RouterPoisoned)?;
        let order = orders
            .get_mut(&report.order_id)
            .ok_or(ExecutionError::UnknownOrder(report.order_id))?;

        if report.status != BrokerOrderStatus::Filled {
            debug!(order_id = report.order_id, status = ?report.status, "broker status");
            return Ok(false);
        }
        if order.filled {
            warn!(order_id = report.order_id, "duplicate fill report ignored");
            return Ok(false);
        }
        if report.filled_quantity == 0 {
            warn!(order_id = report.order_id, "filled report with zero quantity ignored");
            return Ok(false);
        }

        self.events.push(FillEvent {
            timestamp: report.timestamp,
            symbol: order.symbol.clone(),
            exchange: order.exchange.clone(),
            quantity: report.filled_quantity,
            direction: order.direction,
            fill_cost: report.avg_fill_price,
            commission: report.commission,
        })?;
        order.filled = true;
        Ok(true)
    }

    /// Orders registered but not yet filled.
    pub fn open_orders(&self) -> usize {
        self.orders
            .lock()
            .map(|orders| orders.values().filter(|o| !o.filled).count())
            .unwrap_or(0)
    }
}

/// Execution handler that routes orders to an external broker.
pub struct BrokerExecutionHandler<B> {
    broker: B,
    router: FillRouter,
    exchange: String,
    next_order_id: u64,
}

impl<B: BrokerClient> BrokerExecutionHandler<B> {
    pub fn new(broker: B, router: FillRouter, exchange: impl Into<String>) -> Self {
        Self {
            broker,
            router,
            exchange: exchange.into(),
            next_order_id: 1,
        }
    }

    pub fn router(&self) -> &FillRouter {
        &self.router
    }
}

impl<B: BrokerClient> ExecutionHandler for BrokerExecutionHandler<B> {
    fn execute_order(
        &mut self,
        order: &OrderEvent,
        _data: &dyn MarketData,
        _events: &EventSender,
    ) -> Result<(), ExecutionError> {
        let order_id = self.next_order_id;
        self.next_order_id += 1;
        self.router.register(order_id, order, &self.exchange)?;
        debug!(order_id, %order, "placing order");
        self.broker.place_order(order_id, order)
    }
}
