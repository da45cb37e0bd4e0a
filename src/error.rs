use thiserror::Error;

/// Errors surfaced by the ticker cache and its backend client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TickerError {
    /// Transport failure, non-2xx status, unparseable or invalid payload.
    #[error("fetch failed: {0}")]
    FetchFailed(String),

    #[error("invalid ticker symbol: {0:?}")]
    InvalidTicker(String),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, TickerError>;
