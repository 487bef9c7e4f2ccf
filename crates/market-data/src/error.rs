// In crates/market-data/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Market data source unavailable: {0}")]
    SourceUnavailable(String),
    #[error("Market data source error: {0}")]
    SourceError(String),
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(#[from] serde_json::Error),
    #[error("API error: code {code}, msg: {msg}")]
    ApiError { code: i64, msg: String },
    #[error("Source returned an invalid series: {0}")]
    InvalidSeries(#[from] core_types::Error),
}

impl Error {
    /// Connectivity problems that are expected to clear up on their own.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::SourceUnavailable(_) => true,
            Error::RequestFailed(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
