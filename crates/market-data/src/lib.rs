// In crates/market-data/src/lib.rs

use async_trait::async_trait;
use core_types::{CandleSeries, Symbol, Timeframe};

pub mod binance;
pub mod error;
pub mod synthetic;

// Re-export public types
pub use binance::BinanceSource;
pub use error::{Error, Result};
pub use synthetic::SyntheticSource;

/// A provider of OHLCV candles.
///
/// Implementations must return candles in ascending `open_time` order without
/// duplicates; the last candle may still be forming.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// A short name for logs.
    fn name(&self) -> &'static str;

    /// The largest `limit` a single fetch accepts, if the source has one.
    fn max_fetch(&self) -> Option<usize> {
        None
    }

    /// Fetches the latest `limit` candles of `symbol` on `timeframe`.
    async fn fetch(&self, symbol: &Symbol, timeframe: Timeframe, limit: usize) -> Result<CandleSeries>;
}
