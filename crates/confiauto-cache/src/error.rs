use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("key-value store error: {0}")]
    Store(String),

    #[error("vector index error: {0}")]
    Index(String),

    #[error("embedding error: {0}")]
    Embedding(String),

    #[error("cache entry serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
