//! Moving average crossover on closing prices.
//!
//! Per symbol, once `long_window` bars are available:
//! - short SMA > long SMA while out of the market → LONG
//! - short SMA < long SMA while in the market → EXIT

use std::collections::HashMap;

use tracing::debug;

use heartbeat_core::{
    Bar, EventSender, MarketData, MarketEvent, SignalEvent, SignalType, Strategy, StrategyError,
};

#[derive(Debug)]
pub struct MovingAverageCrossStrategy {
    short_window: usize,
    long_window: usize,
    invested: HashMap<String, bool>,
}

impl MovingAverageCrossStrategy {
    /// Windows must satisfy `0 < short_window < long_window`; config
    /// validation enforces this before a strategy is built.
    pub fn new(short_window: usize, long_window: usize) -> Self {
        debug_assert!(short_window > 0 && short_window < long_window);
        Self {
            short_window,
            long_window,
            invested: HashMap::new(),
        }
    }

    pub fn windows(&self) -> (usize, usize) {
        (self.short_window, self.long_window)
    }
}

fn sma(bars: &[Bar]) -> f64 {
    bars.iter().map(|b| b.close).sum::<f64>() / bars.len() as f64
}

impl Strategy for MovingAverageCrossStrategy {
    fn name(&self) -> &str {
        "moving_average_cross"
    }

    fn calculate_signals(
        &mut self,
        _event: &MarketEvent,
        data: &dyn MarketData,
        events: &EventSender,
    ) -> Result<(), StrategyError> {
        for symbol in data.symbols() {
            let bars = data.latest_bars(symbol, self.long_window);
            if bars.len() < self.long_window {
                continue;
            }
            let long = sma(bars);
            let short = sma(&bars[bars.len() - self.short_window..]);
            let Some(timestamp) = bars.last().map(|b| b.timestamp) else {
                continue;
            };

            let invested = self.invested.entry(symbol.clone()).or_insert(false);
            let signal_type = if short > long && !*invested {
                *invested = true;
                SignalType::Long
            } else if short < long && *invested {
                *invested = false;
                SignalType::Exit
            } else {
                continue;
            };

            debug!(symbol = %symbol, %signal_type, short, long, "crossover");
            events.push(SignalEvent::new(symbol.clone(), timestamp, signal_type))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::test_support::{drain_signals, feed};
    use heartbeat_core::{Event, EventQueue, MarketDataProvider};

    fn run(closes: &[f64], short: usize, long: usize) -> Vec<SignalEvent> {
        let mut data = feed(&[("X", closes)]);
        let queue = EventQueue::new();
        let sender = queue.sender();
        let mut strategy = MovingAverageCrossStrategy::new(short, long);
        let mut signals = Vec::new();
        while data.update_bars(&sender).unwrap() {
            let Some(Event::Market(event)) = queue.pop() else {
                panic!("expected a market event");
            };
            strategy.calculate_signals(&event, &data, &sender).unwrap();
            signals.extend(drain_signals(&queue));
        }
        signals
    }

    #[test]
    fn no_signal_before_long_window_fills() {
        assert!(run(&[1.0, 2.0, 3.0], 2, 4).is_empty());
    }

    #[test]
    fn enters_on_uptrend_and_exits_on_reversal() {
        let closes = [10.0, 10.0, 10.0, 11.0, 12.0, 13.0, 12.0, 9.0, 7.0, 6.0];
        let signals = run(&closes, 2, 4);
        let kinds: Vec<SignalType> = signals.iter().map(|s| s.signal_type).collect();
        assert_eq!(kinds, vec![SignalType::Long, SignalType::Exit]);
    }

    #[test]
    fn repeated_uptrend_does_not_repeat_long() {
        let closes: Vec<f64> = (0..20).map(|i| 10.0 + i as f64).collect();
        let signals = run(&closes, 3, 5);
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].signal_type, SignalType::Long);
    }

    #[test]
    fn flat_prices_never_signal() {
        assert!(run(&[5.0; 12], 2, 6).is_empty());
    }
}
