//! Strategy seam: turns market ticks into signals.

use thiserror::Error;

use crate::data::MarketData;
use crate::event::MarketEvent;
use crate::queue::{EventSender, QueueClosed};

#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("strategy '{name}' failed: {message}")]
    Failed { name: String, message: String },

    #[error(transparent)]
    Queue(#[from] QueueClosed),
}

/// Signal generation capability.
///
/// Called once per `Market` event, before the portfolio re-marks its
/// holdings for the same tick. Signals are pushed onto the session queue;
/// a call may emit zero or more of them.
pub trait Strategy: Send {
    /// Human-readable name of this strategy.
    fn name(&self) -> &str;

    fn calculate_signals(
        &mut self,
        event: &MarketEvent,
        data: &dyn MarketData,
        events: &EventSender,
    ) -> Result<(), StrategyError>;
}
