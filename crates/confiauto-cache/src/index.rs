//! Similarity-search tier: Qdrant-backed or in-memory word overlap.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::embeddings::EmbeddingsClient;
use crate::error::CacheError;
use crate::key::point_id;
use crate::types::SimilarityHit;

/// Vector dimension for the default embedding model.
const VECTOR_DIM: u64 = 1024;

/// Similarity tier of the cache.
#[allow(async_fn_in_trait)]
pub trait SimilarityIndex {
    /// Index `text` under `key`; re-upserting the same key replaces it.
    async fn upsert(&self, key: &str, text: &str) -> Result<(), CacheError>;

    /// Top-`top_k` nearest stored entries for `text`, best first.
    async fn search(&self, text: &str, top_k: usize) -> Result<Vec<SimilarityHit>, CacheError>;

    async fn remove(&self, key: &str) -> Result<(), CacheError>;
}

/// In-memory similarity index using token-set Jaccard overlap.
///
/// A deliberately simple approximation of embedding similarity so the cache
/// degrades to usable semantic behavior with no network backends.
#[derive(Clone, Default)]
pub struct WordOverlapIndex {
    tokens_by_key: Arc<RwLock<HashMap<String, HashSet<String>>>>,
}

impl WordOverlapIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn tokenize(text: &str) -> HashSet<String> {
        text.to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| t.len() >= 2)
            .map(str::to_string)
            .collect()
    }

    #[allow(clippy::cast_precision_loss)]
    fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f32 {
        if a.is_empty() && b.is_empty() {
            return 0.0;
        }
        let intersection = a.intersection(b).count();
        let union = a.len() + b.len() - intersection;
        intersection as f32 / union as f32
    }
}

impl SimilarityIndex for WordOverlapIndex {
    async fn upsert(&self, key: &str, text: &str) -> Result<(), CacheError> {
        let tokens = Self::tokenize(text);
        self.tokens_by_key
            .write()
            .await
            .insert(key.to_string(), tokens);
        Ok(())
    }

    async fn search(&self, text: &str, top_k: usize) -> Result<Vec<SimilarityHit>, CacheError> {
        let probe = Self::tokenize(text);
        let stored = self.tokens_by_key.read().await;
        let mut hits: Vec<SimilarityHit> = stored
            .iter()
            .map(|(key, tokens)| SimilarityHit {
                key: key.clone(),
                score: Self::jaccard(&probe, tokens),
            })
            .collect();
        // Deterministic order: score descending, key ascending on ties.
        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.key.cmp(&b.key))
        });
        hits.truncate(top_k);
        Ok(hits)
    }

    async fn remove(&self, key: &str) -> Result<(), CacheError> {
        self.tokens_by_key.write().await.remove(key);
        Ok(())
    }
}

impl std::fmt::Debug for WordOverlapIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WordOverlapIndex").finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct CreateCollectionRequest {
    vectors: VectorsConfig,
}

#[derive(Serialize)]
struct VectorsConfig {
    size: u64,
    distance: String,
}

#[derive(Serialize)]
struct UpsertPointsRequest {
    points: Vec<Point>,
}

#[derive(Serialize)]
struct Point {
    id: u64,
    vector: Vec<f32>,
    payload: HashMap<String, serde_json::Value>,
}

#[derive(Serialize)]
struct SearchRequest {
    vector: Vec<f32>,
    limit: usize,
    with_payload: bool,
}

#[derive(Deserialize)]
struct SearchResponse {
    result: Vec<ScoredPoint>,
}

#[derive(Deserialize)]
struct ScoredPoint {
    score: f32,
    #[serde(default)]
    payload: HashMap<String, serde_json::Value>,
}

#[derive(Serialize)]
struct DeletePointsRequest {
    points: Vec<u64>,
}

/// Qdrant REST similarity index with embeddings from a TEI service.
///
/// Point IDs derive from the cache key hash, so re-caching the same key
/// overwrites its vector instead of accumulating duplicates.
pub struct QdrantIndex {
    client: reqwest::Client,
    base_url: String,
    collection: String,
    embedder: EmbeddingsClient,
}

impl QdrantIndex {
    #[must_use]
    pub fn new(qdrant_url: &str, collection: &str, embedder: EmbeddingsClient) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: qdrant_url.trim_end_matches('/').to_string(),
            collection: collection.to_string(),
            embedder,
        }
    }

    /// Ensure the collection exists, creating it (cosine distance) if absent.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Index`] on network or API failure.
    pub async fn ensure_collection(&self) -> Result<(), CacheError> {
        let url = format!("{}/collections/{}", self.base_url, self.collection);
        let check = self.client.get(&url).send().await;

        if let Ok(resp) = check {
            if resp.status().is_success() {
                return Ok(());
            }
        }

        let body = CreateCollectionRequest {
            vectors: VectorsConfig {
                size: VECTOR_DIM,
                distance: "Cosine".to_string(),
            },
        };

        let resp = self
            .client
            .put(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| CacheError::Index(format!("collection create request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(CacheError::Index(format!(
                "collection create returned status {}",
                resp.status()
            )));
        }

        Ok(())
    }

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>, CacheError> {
        let mut vectors = self.embedder.embed(&[text]).await?;
        vectors
            .pop()
            .ok_or_else(|| CacheError::Embedding("embed service returned no vectors".to_string()))
    }
}

impl SimilarityIndex for QdrantIndex {
    async fn upsert(&self, key: &str, text: &str) -> Result<(), CacheError> {
        let vector = self.embed_one(text).await?;

        let mut payload = HashMap::new();
        payload.insert("key".to_string(), serde_json::json!(key));
        payload.insert("text".to_string(), serde_json::json!(text));

        let body = UpsertPointsRequest {
            points: vec![Point {
                id: point_id(key),
                vector,
                payload,
            }],
        };

        let url = format!("{}/collections/{}/points", self.base_url, self.collection);
        let resp = self
            .client
            .put(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| CacheError::Index(format!("upsert request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(CacheError::Index(format!(
                "upsert returned status {}",
                resp.status()
            )));
        }

        Ok(())
    }

    async fn search(&self, text: &str, top_k: usize) -> Result<Vec<SimilarityHit>, CacheError> {
        let vector = self.embed_one(text).await?;
        let body = SearchRequest {
            vector,
            limit: top_k,
            with_payload: true,
        };

        let url = format!(
            "{}/collections/{}/points/search",
            self.base_url, self.collection
        );
        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| CacheError::Index(format!("search request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(CacheError::Index(format!(
                "search returned status {}",
                resp.status()
            )));
        }

        let parsed: SearchResponse = resp
            .json()
            .await
            .map_err(|e| CacheError::Index(format!("search response parse error: {e}")))?;

        let hits = parsed
            .result
            .into_iter()
            .filter_map(|point| {
                point
                    .payload
                    .get("key")
                    .and_then(|v| v.as_str())
                    .map(|key| SimilarityHit {
                        key: key.to_string(),
                        score: point.score,
                    })
            })
            .collect();
        Ok(hits)
    }

    async fn remove(&self, key: &str) -> Result<(), CacheError> {
        let body = DeletePointsRequest {
            points: vec![point_id(key)],
        };
        let url = format!(
            "{}/collections/{}/points/delete",
            self.base_url, self.collection
        );
        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| CacheError::Index(format!("delete request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(CacheError::Index(format!(
                "delete returned status {}",
                resp.status()
            )));
        }

        Ok(())
    }
}

impl std::fmt::Debug for QdrantIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QdrantIndex")
            .field("base_url", &self.base_url)
            .field("collection", &self.collection)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn identical_texts_overlap_fully() {
        let index = WordOverlapIndex::new();
        index
            .upsert("a", "agencias de autos seminuevos")
            .await
            .unwrap();
        let hits = index
            .search("agencias de autos seminuevos", 5)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert!((hits[0].score - 1.0).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn disjoint_texts_score_zero() {
        let index = WordOverlapIndex::new();
        index.upsert("a", "agencias de autos").await.unwrap();
        let hits = index.search("ferreterías industriales", 5).await.unwrap();
        assert!(hits[0].score.abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn search_is_ordered_and_bounded() {
        let index = WordOverlapIndex::new();
        index.upsert("close", "agencias de autos usados").await.unwrap();
        index.upsert("far", "venta de bicicletas").await.unwrap();
        index.upsert("mid", "autos nuevos y usados").await.unwrap();

        let hits = index.search("agencias de autos usados", 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].key, "close");
        assert!(hits[0].score >= hits[1].score);
    }

    #[tokio::test]
    async fn remove_drops_the_entry() {
        let index = WordOverlapIndex::new();
        index.upsert("a", "agencias de autos").await.unwrap();
        index.remove("a").await.unwrap();
        let hits = index.search("agencias de autos", 5).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn short_tokens_are_ignored() {
        let index = WordOverlapIndex::new();
        index.upsert("a", "autos y camionetas").await.unwrap();
        // "y" is below the token length floor on both sides.
        let hits = index.search("autos o camionetas", 5).await.unwrap();
        assert!((hits[0].score - 1.0).abs() < f32::EPSILON);
    }
}
