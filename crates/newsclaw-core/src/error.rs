//! Error types for the NewsClaw engine.

use thiserror::Error;

/// Convenience result alias used across all NewsClaw crates.
pub type Result<T> = std::result::Result<T, NewsClawError>;

/// Top-level error type.
#[derive(Error, Debug)]
pub enum NewsClawError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Search error: {0}")]
    Search(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Email transport failure, split by retry eligibility: a rate-limited batch
/// may be re-sent, any other transport failure fails the batch outright.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("{0}")]
    Failed(String),
}

impl TransportError {
    /// Whether this failure is in the rate-limit class.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, TransportError::RateLimited(_))
    }
}
