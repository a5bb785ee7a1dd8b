use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The record carries no identity or no substance and cannot be ingested.
    #[error("Normalization error: {0}")]
    Normalization(String),

    /// Internal classifier fault. Callers degrade instead of propagating.
    #[error("Classification error: {0}")]
    Classification(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Storage not connected")]
    NotConnected,

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Broadcast error: {0}")]
    Broadcast(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("A crawl is already running")]
    CrawlInProgress,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("External error: {0}")]
    External(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
