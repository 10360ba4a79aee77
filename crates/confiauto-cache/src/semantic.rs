//! The two-tier cache facade: exact store first, similarity index behind it.

use std::time::Duration;

use chrono::Utc;

use crate::error::CacheError;
use crate::index::{SimilarityIndex, WordOverlapIndex};
use crate::key::{normalize_key, semantic_text};
use crate::store::{EntryStore, MemoryStore};
use crate::types::{CacheEntry, CacheLookup};

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Minimum similarity for accepting a non-exact candidate.
    pub similarity_threshold: f32,
    /// Candidates fetched from the similarity index per lookup.
    pub top_k: usize,
    /// Time-to-live for cached search results.
    pub result_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.85,
            top_k: 5,
            result_ttl: Duration::from_secs(3600),
        }
    }
}

/// Two-tier semantic cache in front of the analysis pipeline.
///
/// Generic over both tiers so the orchestration code never knows which
/// backends are configured; [`SemanticCache::in_memory`] wires the
/// no-network pair used for local runs and tests.
pub struct SemanticCache<S: EntryStore, I: SimilarityIndex> {
    store: S,
    index: Option<I>,
    config: CacheConfig,
}

impl SemanticCache<MemoryStore, WordOverlapIndex> {
    /// Fully in-memory cache: exact map plus word-overlap similarity.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(
            MemoryStore::new(),
            Some(WordOverlapIndex::new()),
            CacheConfig::default(),
        )
    }

    /// In-memory cache with a custom configuration (tests mostly tune the
    /// similarity threshold).
    #[must_use]
    pub fn in_memory_with_config(config: CacheConfig) -> Self {
        Self::new(MemoryStore::new(), Some(WordOverlapIndex::new()), config)
    }
}

impl<S: EntryStore, I: SimilarityIndex> SemanticCache<S, I> {
    #[must_use]
    pub fn new(store: S, index: Option<I>, config: CacheConfig) -> Self {
        Self {
            store,
            index,
            config,
        }
    }

    /// Look up a cached result for `query` at `location`.
    ///
    /// Exact key match first; on miss, the similarity index (when
    /// configured) is consulted and the first candidate at or above the
    /// threshold whose entry is still alive is returned. Either hit kind
    /// bumps the entry's hit counter (best-effort, last write wins).
    ///
    /// A failing similarity backend degrades to a miss rather than an
    /// error: the caller can always recompute.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] only when the exact-match store itself fails.
    pub async fn get(&self, query: &str, location: &str) -> Result<CacheLookup, CacheError> {
        let key = normalize_key(query, location);

        if let Some(entry) = self.store.get(&key).await? {
            let entry = self.bump_hits(entry).await;
            tracing::debug!(key = %key, hits = entry.hit_count, "exact cache hit");
            return Ok(CacheLookup::Exact(entry));
        }

        let Some(index) = &self.index else {
            return Ok(CacheLookup::Miss);
        };

        let probe = semantic_text(query, location);
        let hits = match index.search(&probe, self.config.top_k).await {
            Ok(hits) => hits,
            Err(e) => {
                tracing::warn!(error = %e, "similarity search failed — treating as miss");
                return Ok(CacheLookup::Miss);
            }
        };

        for hit in hits {
            if hit.score < self.config.similarity_threshold {
                break;
            }
            if let Some(entry) = self.store.get(&hit.key).await? {
                let entry = self.bump_hits(entry).await;
                tracing::debug!(
                    key = %key,
                    matched = %hit.key,
                    score = hit.score,
                    "similarity cache hit"
                );
                return Ok(CacheLookup::Similar {
                    entry,
                    score: hit.score,
                });
            }
            // The vector outlived its entry (TTL eviction); try the next
            // candidate.
            tracing::debug!(matched = %hit.key, "similarity hit without backing entry");
        }

        Ok(CacheLookup::Miss)
    }

    /// Cache a computed result under `query` + `location`.
    ///
    /// Writes the entry with the configured TTL and indexes its text for
    /// future similarity lookups. Index failures are logged, not raised:
    /// the exact-match tier alone is still a valid cache.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] when the entry store write fails.
    pub async fn set(
        &self,
        query: &str,
        location: &str,
        payload: serde_json::Value,
    ) -> Result<(), CacheError> {
        let key = normalize_key(query, location);
        let entry = CacheEntry {
            key: key.clone(),
            query: query.trim().to_string(),
            location: location.trim().to_string(),
            result_payload: payload,
            timestamp_ms: Utc::now().timestamp_millis(),
            hit_count: 0,
        };

        self.store.put(&entry, self.config.result_ttl).await?;

        if let Some(index) = &self.index {
            let text = semantic_text(query, location);
            if let Err(e) = index.upsert(&key, &text).await {
                tracing::warn!(key = %key, error = %e, "similarity index upsert failed");
            }
        }

        Ok(())
    }

    /// Delete entries (and their index vectors) older than `days` days.
    /// Returns the number of entries removed.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] when the store scan fails; individual delete
    /// failures are logged and skipped.
    pub async fn clear_older_than(&self, days: u32) -> Result<usize, CacheError> {
        let cutoff_ms = Utc::now().timestamp_millis() - i64::from(days) * 86_400_000;
        let mut removed = 0usize;

        for key in self.store.keys().await? {
            let Some(entry) = self.store.get(&key).await? else {
                continue;
            };
            if entry.timestamp_ms >= cutoff_ms {
                continue;
            }
            if let Err(e) = self.store.delete(&key).await {
                tracing::warn!(key = %key, error = %e, "failed to delete stale cache entry");
                continue;
            }
            if let Some(index) = &self.index {
                if let Err(e) = index.remove(&key).await {
                    tracing::warn!(key = %key, error = %e, "failed to delete stale index vector");
                }
            }
            removed += 1;
        }

        if removed > 0 {
            tracing::info!(removed, days, "purged stale cache entries");
        }
        Ok(removed)
    }

    async fn bump_hits(&self, mut entry: CacheEntry) -> CacheEntry {
        entry.hit_count += 1;
        if let Err(e) = self.store.put(&entry, self.config.result_ttl).await {
            tracing::warn!(key = %entry.key, error = %e, "failed to persist hit counter");
        }
        entry
    }
}

impl<S: EntryStore, I: SimilarityIndex> std::fmt::Debug for SemanticCache<S, I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SemanticCache")
            .field("config", &self.config)
            .field("has_index", &self.index.is_some())
            .finish()
    }
}
