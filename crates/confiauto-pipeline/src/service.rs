//! The produced "analyze" operation: semantic cache in front of the pipeline.

use confiauto_cache::{EntryStore, SemanticCache, SimilarityIndex};
use confiauto_core::Location;

use crate::error::PipelineError;
use crate::pipeline::AnalysisPipeline;
use crate::providers::{DeepResearchProvider, DiscoveryProvider, ReviewsProvider};
use crate::types::PipelineResult;

/// Cache keys carry the location at this precision (~11 m), so nearby
/// requests from the same user keep hitting the same entry.
const LOCATION_KEY_DECIMALS: usize = 4;

/// Analysis entry point: consults the semantic cache, runs the pipeline on
/// a miss, and caches the serialized result.
///
/// Cache problems never fail an analysis — a poisoned or unreachable cache
/// degrades to recomputation.
pub struct AnalysisService<D, R, X, S: EntryStore, I: SimilarityIndex> {
    pipeline: AnalysisPipeline<D, R, X>,
    cache: SemanticCache<S, I>,
}

impl<D, R, X, S, I> AnalysisService<D, R, X, S, I>
where
    D: DiscoveryProvider,
    R: ReviewsProvider,
    X: DeepResearchProvider,
    S: EntryStore,
    I: SimilarityIndex,
{
    pub fn new(pipeline: AnalysisPipeline<D, R, X>, cache: SemanticCache<S, I>) -> Self {
        Self { pipeline, cache }
    }

    /// Analyze `query` around `user_location`, serving from cache when a
    /// previous (or sufficiently similar) search is still fresh.
    ///
    /// # Errors
    ///
    /// Propagates [`PipelineError`] from an uncached run; cache failures
    /// only trigger recomputation.
    pub async fn analyze(
        &self,
        query: &str,
        user_location: Location,
    ) -> Result<PipelineResult, PipelineError> {
        let location_key = format!(
            "{:.prec$},{:.prec$}",
            user_location.lat,
            user_location.lng,
            prec = LOCATION_KEY_DECIMALS
        );

        match self.cache.get(query, &location_key).await {
            Ok(lookup) if lookup.is_hit() => {
                if let Some(entry) = lookup.into_entry() {
                    match serde_json::from_value::<PipelineResult>(entry.result_payload) {
                        Ok(result) => {
                            tracing::info!(query, location = %location_key, "serving analysis from cache");
                            return Ok(result);
                        }
                        Err(e) => {
                            tracing::warn!(
                                query,
                                error = %e,
                                "cached payload failed to deserialize — recomputing"
                            );
                        }
                    }
                }
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(query, error = %e, "cache lookup failed — recomputing");
            }
        }

        let result = self.pipeline.run(query, user_location).await?;

        match serde_json::to_value(&result) {
            Ok(payload) => {
                if let Err(e) = self.cache.set(query, &location_key, payload).await {
                    tracing::warn!(query, error = %e, "failed to cache analysis result");
                }
            }
            Err(e) => {
                tracing::warn!(query, error = %e, "analysis result not serializable for cache");
            }
        }

        Ok(result)
    }

    /// Purge cached analyses older than `days` days. Returns the number of
    /// entries removed; sweep failures are logged and yield zero.
    pub async fn purge_cache_older_than(&self, days: u32) -> usize {
        match self.cache.clear_older_than(days).await {
            Ok(removed) => removed,
            Err(e) => {
                tracing::warn!(error = %e, "cache purge failed");
                0
            }
        }
    }
}

impl<D, R, X, S: EntryStore, I: SimilarityIndex> std::fmt::Debug
    for AnalysisService<D, R, X, S, I>
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisService").finish_non_exhaustive()
    }
}
