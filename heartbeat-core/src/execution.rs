//! Execution seam: turns orders into fills.

use thiserror::Error;

use crate::data::MarketData;
use crate::event::OrderEvent;
use crate::queue::{EventSender, QueueClosed};

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("no market price available for '{symbol}'")]
    NoPrice { symbol: String },

    #[error("broker rejected order {order_id}: {message}")]
    Broker { order_id: u64, message: String },

    #[error("status report for unknown order id {0}")]
    UnknownOrder(u64),

    #[error("fill router lock poisoned")]
    RouterPoisoned,

    #[error(transparent)]
    Queue(#[from] QueueClosed),
}

/// Order execution capability.
///
/// A simulated handler pushes the fill before returning. A live handler may
/// instead hand the fill to a callback that pushes it later, possibly from
/// another thread, onto the same queue. Retry policy, if any, lives here:
/// the orchestrator never re-submits an order.
pub trait ExecutionHandler: Send {
    fn execute_order(
        &mut self,
        order: &OrderEvent,
        data: &dyn MarketData,
        events: &EventSender,
    ) -> Result<(), ExecutionError>;
}
