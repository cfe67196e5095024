//! Historic bar feed: replays pre-loaded bars one timestamp per heartbeat.
//!
//! Symbols rarely share an identical calendar, so the feed aligns them on
//! the union of all timestamps. A symbol with no bar at some timestamp
//! carries its previous bar forward; before its first bar it has none.

use std::collections::{BTreeSet, HashMap};

use tracing::{debug, warn};

use super::bar::Bar;
use super::provider::{DataError, MarketData, MarketDataProvider};
use crate::event::{MarketEvent, Timestamp};
use crate::queue::EventSender;

/// In-memory aligned bar feed.
#[derive(Debug, Clone)]
pub struct HistoricBarFeed {
    symbols: Vec<String>,
    index: HashMap<String, usize>,
    timestamps: Vec<Timestamp>,
    /// Aligned bars per symbol, one slot per timestamp.
    aligned: Vec<Vec<Option<Bar>>>,
    /// Bars released so far per symbol.
    released: Vec<Vec<Bar>>,
    cursor: usize,
    carried_forward: usize,
}

impl HistoricBarFeed {
    /// Build a feed for `symbols` from bars keyed by symbol.
    ///
    /// Every symbol must have an entry in `bars`. Bars are sorted by
    /// timestamp; duplicates keep the last occurrence.
    pub fn new(
        symbols: Vec<String>,
        mut bars: HashMap<String, Vec<Bar>>,
    ) -> Result<Self, DataError> {
        if symbols.is_empty() {
            return Err(DataError::NoSymbols);
        }

        let mut per_symbol = Vec::with_capacity(symbols.len());
        for symbol in &symbols {
            let mut series = bars
                .remove(symbol)
                .ok_or_else(|| DataError::MissingSymbol {
                    symbol: symbol.clone(),
                })?;
            series.sort_by_key(|bar| bar.timestamp);
            series.reverse();
            series.dedup_by_key(|bar| bar.timestamp);
            series.reverse();
            per_symbol.push(series);
        }

        let timestamps: Vec<Timestamp> = per_symbol
            .iter()
            .flat_map(|series| series.iter().map(|bar| bar.timestamp))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut carried_forward = 0;
        let aligned = per_symbol
            .iter()
            .map(|series| {
                let mut slots = Vec::with_capacity(timestamps.len());
                let mut next = 0;
                let mut previous: Option<&Bar> = None;
                for &ts in &timestamps {
                    if next < series.len() && series[next].timestamp == ts {
                        previous = Some(&series[next]);
                        slots.push(Some(series[next].clone()));
                        next += 1;
                    } else if let Some(bar) = previous {
                        carried_forward += 1;
                        slots.push(Some(Bar {
                            timestamp: ts,
                            ..bar.clone()
                        }));
                    } else {
                        slots.push(None);
                    }
                }
                slots
            })
            .collect();

        if carried_forward > 0 {
            warn!(
                carried_forward,
                "bar calendars differ across symbols; carrying previous bars forward"
            );
        }

        let index = symbols
            .iter()
            .enumerate()
            .map(|(i, s)| (s.clone(), i))
            .collect();
        let released = vec![Vec::new(); symbols.len()];

        Ok(Self {
            symbols,
            index,
            timestamps,
            aligned,
            released,
            cursor: 0,
            carried_forward,
        })
    }

    /// Total number of heartbeats this feed will produce.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Heartbeats not yet replayed.
    pub fn remaining(&self) -> usize {
        self.timestamps.len() - self.cursor
    }

    /// First timestamp of the feed, if any.
    pub fn first_timestamp(&self) -> Option<Timestamp> {
        self.timestamps.first().copied()
    }

    /// Number of padded slots created during alignment.
    pub fn carried_forward(&self) -> usize {
        self.carried_forward
    }
}

impl MarketData for HistoricBarFeed {
    fn symbols(&self) -> &[String] {
        &self.symbols
    }

    fn latest_bars(&self, symbol: &str, n: usize) -> &[Bar] {
        match self.index.get(symbol) {
            Some(&i) => {
                let bars = &self.released[i];
                &bars[bars.len().saturating_sub(n)..]
            }
            None => &[],
        }
    }
}

impl MarketDataProvider for HistoricBarFeed {
    fn update_bars(&mut self, events: &EventSender) -> Result<bool, DataError> {
        let Some(&timestamp) = self.timestamps.get(self.cursor) else {
            return Ok(false);
        };
        for (slots, released) in self.aligned.iter().zip(self.released.iter_mut()) {
            if let Some(bar) = &slots[self.cursor] {
                released.push(bar.clone());
            }
        }
        self.cursor += 1;
        debug!(%timestamp, remaining = self.remaining(), "bars advanced");
        events.push(MarketEvent { timestamp })?;
        Ok(true)
    }

    fn market_data(&self) -> &dyn MarketData {
        self
    }
}
