use serde::{Deserialize, Serialize};

/// One cached analysis result plus its bookkeeping metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    /// Normalized `"{query}:{location}"` key.
    pub key: String,
    /// Original (trimmed) query for observability.
    pub query: String,
    pub location: String,
    pub result_payload: serde_json::Value,
    /// Creation time, Unix epoch milliseconds.
    pub timestamp_ms: i64,
    pub hit_count: u64,
}

/// One similarity-search candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityHit {
    pub key: String,
    /// Similarity in [0, 1]; higher is closer.
    pub score: f32,
}

/// Outcome of a cache lookup.
#[derive(Debug)]
pub enum CacheLookup {
    /// Direct key match.
    Exact(CacheEntry),
    /// Entry cached under a similar query, with its similarity score.
    Similar { entry: CacheEntry, score: f32 },
    Miss,
}

impl CacheLookup {
    #[must_use]
    pub fn is_hit(&self) -> bool {
        !matches!(self, CacheLookup::Miss)
    }

    /// Consumes the lookup and returns the entry for either hit kind.
    #[must_use]
    pub fn into_entry(self) -> Option<CacheEntry> {
        match self {
            CacheLookup::Exact(entry) | CacheLookup::Similar { entry, .. } => Some(entry),
            CacheLookup::Miss => None,
        }
    }
}
