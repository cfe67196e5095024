//! Buy-and-hold: go long every symbol on its first bar and never exit.

use std::collections::HashSet;

use tracing::debug;

use heartbeat_core::{
    EventSender, MarketData, MarketEvent, SignalEvent, SignalType, Strategy, StrategyError,
};

/// Emits exactly one LONG per symbol, on the first tick that symbol has a bar.
#[derive(Debug, Default)]
pub struct BuyAndHoldStrategy {
    bought: HashSet<String>,
}

impl BuyAndHoldStrategy {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Strategy for BuyAndHoldStrategy {
    fn name(&self) -> &str {
        "buy_and_hold"
    }

    fn calculate_signals(
        &mut self,
        _event: &MarketEvent,
        data: &dyn MarketData,
        events: &EventSender,
    ) -> Result<(), StrategyError> {
        for symbol in data.symbols() {
            if self.bought.contains(symbol) {
                continue;
            }
            let Some(bar) = data.latest_bar(symbol) else {
                continue;
            };
            debug!(symbol = %symbol, timestamp = %bar.timestamp, "buy and hold entry");
            events.push(SignalEvent::new(symbol.clone(), bar.timestamp, SignalType::Long))?;
            self.bought.insert(symbol.clone());
        }
        Ok(())
    }
}
