//! Naive order sizing: a fixed-quantity entry/exit rule table.
//!
//! | signal | current quantity | order            |
//! |--------|------------------|------------------|
//! | LONG   | 0                | BUY 100          |
//! | SHORT  | 0                | SELL 100         |
//! | EXIT   | > 0              | SELL abs(qty)    |
//! | EXIT   | < 0              | BUY abs(qty)     |
//!
//! Every other combination yields no order. That is a policy outcome, not
//! an error: a LONG while already long is simply ignored.

use crate::event::{Direction, OrderEvent, SignalEvent, SignalType};

/// Units per entry order.
pub const NAIVE_ORDER_QUANTITY: u64 = 100;

/// Apply the rule table to a signal given the symbol's current quantity.
pub fn naive_order(signal: &SignalEvent, current_quantity: i64) -> Option<OrderEvent> {
    let (quantity, direction) = match (signal.signal_type, current_quantity) {
        (SignalType::Long, 0) => (NAIVE_ORDER_QUANTITY, Direction::Buy),
        (SignalType::Short, 0) => (NAIVE_ORDER_QUANTITY, Direction::Sell),
        (SignalType::Exit, q) if q > 0 => (q.unsigned_abs(), Direction::Sell),
        (SignalType::Exit, q) if q < 0 => (q.unsigned_abs(), Direction::Buy),
        _ => return None,
    };
    Some(OrderEvent::market(signal.symbol.clone(), quantity, direction))
}
