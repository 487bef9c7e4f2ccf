// In crates/strategies/src/error.rs

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The pipeline was handed an empty series.
    #[error("Not enough candles to compute signals")]
    InsufficientData,

    #[error("Invalid strategy parameters: {0}")]
    InvalidParameters(String),

    #[error("Invalid candle series: {0}")]
    Series(#[from] core_types::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
