// In crates/core-types/src/error.rs

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Candle {index} does not come strictly after its predecessor (open_time {open_time})")]
    UnorderedCandles { index: usize, open_time: i64 },

    #[error("Candle {index} is invalid: {reason}")]
    InvalidCandle { index: usize, reason: String },

    #[error("Unknown timeframe: {0}")]
    UnknownTimeframe(String),
}

pub type Result<T> = std::result::Result<T, Error>;
