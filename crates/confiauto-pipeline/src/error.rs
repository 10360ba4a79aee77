use thiserror::Error;

/// Errors from the external provider clients (discovery, reviews, research).
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rate limited (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("provider returned status '{status}'")]
    Api { status: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors terminating a whole pipeline run.
///
/// Only discovery can fail the run; everything downstream degrades into
/// `metadata.errors` instead.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no candidates found for query '{query}'")]
    NoCandidates { query: String },

    #[error("discovery failed: {0}")]
    Discovery(#[from] ProviderError),
}
