// In crates/events/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Notification could not be delivered: {0}")]
    NotifierError(String),
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
