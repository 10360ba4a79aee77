//! The analysis pipeline: discovery → batched per-candidate processing →
//! ranking → optional deep-research augmentation.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::future::join_all;

use confiauto_core::criteria::CriteriaLoader;
use confiauto_core::{Agency, AppConfig, FilteringCriteria, Location};
use confiauto_trust::score_trust;
use confiauto_validator::{should_process_agency, validate, validate_agency};

use crate::error::{PipelineError, ProviderError};
use crate::providers::{
    compose_keyword, DeepResearchProvider, DiscoveryProvider, ReviewsProvider,
};
use crate::types::{AnalysisResult, PipelineMetadata, PipelineResult};

/// Deep analysis is applied to at most this many top-ranked results.
const DEEP_ANALYSIS_MAX_CANDIDATES: usize = 3;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub search_radius_meters: u32,
    /// Quality gate applied before spending review-fetch budget.
    pub min_rating: f64,
    pub max_agencies: usize,
    /// Concurrent review fetches in flight; batches are strict barriers.
    pub batch_size: usize,
    pub fallback_without_reviews: bool,
    pub deep_analysis_enabled: bool,
    pub deep_analysis_min_trust: u8,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            search_radius_meters: 5000,
            min_rating: 3.0,
            max_agencies: 10,
            batch_size: 3,
            fallback_without_reviews: true,
            deep_analysis_enabled: false,
            deep_analysis_min_trust: 30,
        }
    }
}

impl PipelineConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            search_radius_meters: config.search_radius_meters,
            min_rating: config.min_rating,
            max_agencies: config.max_agencies,
            batch_size: config.batch_size.max(1),
            fallback_without_reviews: config.fallback_without_reviews,
            deep_analysis_enabled: config.deep_analysis_enabled,
            deep_analysis_min_trust: config.deep_analysis_min_trust,
        }
    }
}

/// Placeholder research provider for pipelines without deep analysis.
/// Never invoked: the pipeline only calls research when one is attached.
#[derive(Debug, Clone, Copy)]
pub struct DisabledResearch;

impl DeepResearchProvider for DisabledResearch {
    async fn analyze(
        &self,
        _name: &str,
        _address: &str,
        _place_id: &str,
    ) -> Result<serde_json::Value, ProviderError> {
        Err(ProviderError::Api {
            status: "deep analysis disabled".to_string(),
        })
    }
}

enum CandidateOutcome {
    Completed {
        result: Box<AnalysisResult>,
        /// Degradations recorded while still completing (e.g. a review
        /// fetch that fell back to an empty corpus).
        notes: Vec<String>,
    },
    Rejected {
        name: String,
        reason: String,
    },
    Failed {
        name: String,
        error: String,
    },
}

/// The orchestration pipeline.
///
/// Generic over the three collaborator providers so tests drive it with
/// in-process doubles. Past discovery it never raises: per-candidate
/// failures, validation rejections, and deep-analysis errors degrade into
/// `metadata.errors`.
pub struct AnalysisPipeline<D, R, X = DisabledResearch> {
    discovery: D,
    reviews: R,
    research: Option<X>,
    criteria: Arc<CriteriaLoader>,
    config: PipelineConfig,
}

impl<D, R> AnalysisPipeline<D, R> {
    pub fn new(discovery: D, reviews: R, criteria: Arc<CriteriaLoader>, config: PipelineConfig) -> Self {
        Self {
            discovery,
            reviews,
            research: None,
            criteria,
            config,
        }
    }
}

impl<D, R, X> AnalysisPipeline<D, R, X> {
    /// Attach a deep-research provider for post-ranking augmentation.
    pub fn with_research<X2>(self, research: X2) -> AnalysisPipeline<D, R, X2> {
        AnalysisPipeline {
            discovery: self.discovery,
            reviews: self.reviews,
            research: Some(research),
            criteria: self.criteria,
            config: self.config,
        }
    }
}

impl<D, R, X> AnalysisPipeline<D, R, X>
where
    D: DiscoveryProvider,
    R: ReviewsProvider,
    X: DeepResearchProvider,
{
    /// Run the full analysis for a query around the user's location.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::NoCandidates`] when discovery yields
    /// nothing — an empty result set is terminal for the query — and
    /// [`PipelineError::Discovery`] when the discovery call itself fails.
    pub async fn run(
        &self,
        query: &str,
        user_location: Location,
    ) -> Result<PipelineResult, PipelineError> {
        let started = Instant::now();
        let criteria = self.criteria.load(false);
        let keyword = compose_keyword(query);

        let candidates = self
            .discovery
            .search(user_location, self.config.search_radius_meters, &keyword)
            .await?;
        let total_found = candidates.len();

        if candidates.is_empty() {
            return Err(PipelineError::NoCandidates {
                query: query.to_string(),
            });
        }

        let mut eligible: Vec<Agency> = candidates
            .into_iter()
            .filter(|a| a.rating.is_some_and(|r| r >= self.config.min_rating))
            .collect();
        eligible.truncate(self.config.max_agencies);

        tracing::info!(
            query,
            total_found,
            eligible = eligible.len(),
            "discovery complete — processing candidates"
        );

        let mut errors: Vec<String> = Vec::new();
        let mut results: Vec<AnalysisResult> = Vec::new();

        // Strict batches: all candidates of a batch run concurrently, and
        // the next batch starts only when the whole batch has settled.
        for batch in eligible.chunks(self.config.batch_size.max(1)) {
            let outcomes = join_all(
                batch
                    .iter()
                    .map(|agency| self.process_candidate(agency, user_location, &criteria)),
            )
            .await;

            for outcome in outcomes {
                match outcome {
                    CandidateOutcome::Completed { result, notes } => {
                        errors.extend(notes);
                        results.push(*result);
                    }
                    CandidateOutcome::Rejected { name, reason } => {
                        errors.push(format!("{name}: excluido por validación ({reason})"));
                    }
                    CandidateOutcome::Failed { name, error } => {
                        errors.push(format!("{name}: {error}"));
                    }
                }
            }
        }

        // Stable sort: equal scores keep discovery order.
        results.sort_by(|a, b| {
            b.trust_analysis
                .trust_score
                .cmp(&a.trust_analysis.trust_score)
        });

        let total_with_deep_analysis = self.augment_top_results(&mut results, &mut errors).await;

        #[allow(clippy::cast_possible_truncation)]
        let execution_time_ms = started.elapsed().as_millis() as u64;

        let metadata = PipelineMetadata {
            total_found,
            total_processed: results.len(),
            total_with_reviews: results.iter().filter(|r| r.reviews_count > 0).count(),
            total_with_deep_analysis,
            execution_time_ms,
            errors,
        };

        tracing::info!(
            query,
            processed = metadata.total_processed,
            errors = metadata.errors.len(),
            elapsed_ms = execution_time_ms,
            "pipeline run complete"
        );

        Ok(PipelineResult {
            agencies: results,
            metadata,
        })
    }

    async fn process_candidate(
        &self,
        agency: &Agency,
        user_location: Location,
        criteria: &FilteringCriteria,
    ) -> CandidateOutcome {
        let mut notes = Vec::new();

        let reviews = match self.reviews.fetch_reviews(&agency.place_id).await {
            Ok(reviews) => reviews,
            Err(e) if self.config.fallback_without_reviews => {
                tracing::warn!(
                    agency = %agency.name,
                    error = %e,
                    "review fetch failed — continuing without reviews"
                );
                notes.push(format!(
                    "{}: error al obtener reseñas, se continúa sin ellas: {e}",
                    agency.name
                ));
                Vec::new()
            }
            Err(e) => {
                tracing::warn!(agency = %agency.name, error = %e, "review fetch failed — dropping candidate");
                return CandidateOutcome::Failed {
                    name: agency.name.clone(),
                    error: format!("error al obtener reseñas: {e}"),
                };
            }
        };

        let validation = if criteria.features.use_enhanced_validation {
            validate_agency(agency, &reviews, criteria).summary()
        } else {
            validate(&agency.name, &reviews, criteria)
        };

        if !should_process_agency(&validation, agency.rating) {
            tracing::debug!(
                agency = %agency.name,
                confidence = validation.confidence,
                reason = %validation.reason,
                "candidate rejected by validation"
            );
            return CandidateOutcome::Rejected {
                name: agency.name.clone(),
                reason: validation.reason,
            };
        }

        let trust_analysis = score_trust(&reviews);
        let distance_km = user_location.distance_km(agency.location);

        CandidateOutcome::Completed {
            result: Box::new(AnalysisResult {
                agency: agency.clone(),
                trust_analysis,
                reviews_count: reviews.len(),
                reviews,
                distance_km,
                deep_analysis: None,
                timestamp: Utc::now(),
            }),
            notes,
        }
    }

    /// Run deep research for the top-ranked results that clear the trust
    /// floor. Failures are recorded and never affect ranking.
    async fn augment_top_results(
        &self,
        results: &mut [AnalysisResult],
        errors: &mut Vec<String>,
    ) -> usize {
        if !self.config.deep_analysis_enabled {
            return 0;
        }
        let Some(research) = &self.research else {
            return 0;
        };

        let selected: Vec<usize> = results
            .iter()
            .enumerate()
            .filter(|(_, r)| r.trust_analysis.trust_score >= self.config.deep_analysis_min_trust)
            .map(|(i, _)| i)
            .take(DEEP_ANALYSIS_MAX_CANDIDATES)
            .collect();

        if selected.is_empty() {
            return 0;
        }

        let outcomes = join_all(selected.iter().map(|&i| {
            let r = &results[i];
            research.analyze(&r.agency.name, &r.agency.address, &r.agency.place_id)
        }))
        .await;

        let mut augmented = 0usize;
        for (&i, outcome) in selected.iter().zip(outcomes) {
            match outcome {
                Ok(payload) => {
                    results[i].deep_analysis = Some(payload);
                    augmented += 1;
                }
                Err(e) => {
                    tracing::warn!(
                        agency = %results[i].agency.name,
                        error = %e,
                        "deep analysis failed"
                    );
                    errors.push(format!(
                        "{}: análisis profundo no disponible: {e}",
                        results[i].agency.name
                    ));
                }
            }
        }
        augmented
    }
}

impl<D, R, X> std::fmt::Debug for AnalysisPipeline<D, R, X> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisPipeline")
            .field("config", &self.config)
            .field("has_research", &self.research.is_some())
            .finish_non_exhaustive()
    }
}
