//! Concrete strategies and the config factory.

pub mod buy_and_hold;
pub mod moving_average_cross;

pub use buy_and_hold::BuyAndHoldStrategy;
pub use moving_average_cross::MovingAverageCrossStrategy;

use heartbeat_core::Strategy;

use crate::config::StrategyConfig;

/// Build the strategy named by a config.
pub fn build_strategy(config: &StrategyConfig) -> Box<dyn Strategy> {
    match *config {
        StrategyConfig::BuyAndHold => Box::new(BuyAndHoldStrategy::new()),
        StrategyConfig::MovingAverageCross {
            short_window,
            long_window,
        } => Box::new(MovingAverageCrossStrategy::new(short_window, long_window)),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::HashMap;

    use chrono::{Duration, TimeZone, Utc};
    use heartbeat_core::{Bar, Event, EventQueue, HistoricBarFeed, SignalEvent};

    /// Daily bars per symbol from closing prices, starting 2024-01-01.
    pub fn feed(series: &[(&str, &[f64])]) -> HistoricBarFeed {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut bars = HashMap::new();
        for (symbol, closes) in series {
            let list = closes
                .iter()
                .enumerate()
                .map(|(i, &c)| Bar {
                    symbol: symbol.to_string(),
                    timestamp: start + Duration::days(i as i64),
                    open: c,
                    high: c,
                    low: c,
                    close: c,
                    volume: 1_000,
                    adj_close: c,
                })
                .collect();
            bars.insert(symbol.to_string(), list);
        }
        let symbols = series.iter().map(|(s, _)| s.to_string()).collect();
        HistoricBarFeed::new(symbols, bars).unwrap()
    }

    pub fn drain_signals(queue: &EventQueue) -> Vec<SignalEvent> {
        let mut out = Vec::new();
        while let Some(event) = queue.pop() {
            if let Event::Signal(signal) = event {
                out.push(signal);
            }
        }
        out
    }
}
