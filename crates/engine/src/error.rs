// In crates/engine/src/error.rs

use std::time::Duration;
use thiserror::Error;

/// Everything that can go wrong during one iteration of a trading loop.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Market data error: {0}")]
    MarketData(#[from] market_data::Error),

    #[error("Strategy error: {0}")]
    Strategy(#[from] strategies::Error),

    #[error("Fetching candles took longer than {0:?}")]
    FetchTimeout(Duration),
}

impl Error {
    /// Failures worth retrying on the next iteration without operator action.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::FetchTimeout(_) => true,
            Error::MarketData(e) => e.is_transient(),
            Error::Strategy(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeouts_and_outages_are_transient() {
        assert!(Error::FetchTimeout(Duration::from_secs(30)).is_transient());
        assert!(Error::MarketData(market_data::Error::SourceUnavailable("down".to_string())).is_transient());
        assert!(!Error::MarketData(market_data::Error::ApiError { code: -1121, msg: "Invalid symbol.".to_string() }).is_transient());
        assert!(!Error::Strategy(strategies::Error::InsufficientData).is_transient());
    }
}

pub type Result<T> = std::result::Result<T, Error>;
