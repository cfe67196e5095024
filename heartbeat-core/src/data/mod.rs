//! Market data: bars, the provider seam, and an in-memory aligned feed.

pub mod bar;
pub mod feed;
pub mod provider;

pub use bar::{Bar, BarField};
pub use feed::HistoricBarFeed;
pub use provider::{DataError, MarketData, MarketDataProvider};
