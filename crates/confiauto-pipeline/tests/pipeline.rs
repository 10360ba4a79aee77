//! Orchestration tests driven by in-process provider doubles: terminal
//! discovery errors, batching bounds, partial-failure isolation, ranking,
//! and deep-analysis augmentation.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use confiauto_core::criteria::CriteriaLoader;
use confiauto_core::{Agency, Location, Review};
use confiauto_pipeline::{
    AnalysisPipeline, DeepResearchProvider, DiscoveryProvider, PipelineConfig, PipelineError,
    ProviderError, ReviewsProvider,
};

const USER: Location = Location {
    lat: 19.4326,
    lng: -99.1332,
};

fn loader() -> Arc<CriteriaLoader> {
    // Nonexistent path: the loader serves the compiled-in defaults.
    Arc::new(CriteriaLoader::new(PathBuf::from(
        "/nonexistent/criteria.yaml",
    )))
}

fn agency(place_id: &str, name: &str, rating: Option<f64>) -> Agency {
    Agency {
        place_id: place_id.to_string(),
        name: name.to_string(),
        address: "Av. Insurgentes 100".to_string(),
        location: Location {
            lat: 19.44,
            lng: -99.14,
        },
        rating,
        total_reviews: Some(40),
        phone_number: None,
        website: None,
        opening_hours: None,
        place_types: vec!["car_dealer".to_string()],
    }
}

fn review(rating: u8, text: &str) -> Review {
    Review {
        author: "Cliente".to_string(),
        rating,
        text: text.to_string(),
        time: 1_700_000_000,
        relative_time_description: "hace un mes".to_string(),
    }
}

fn detailed_reviews(rating: u8, n: usize) -> Vec<Review> {
    (0..n)
        .map(|_| {
            review(
                rating,
                "El proceso de compra fue claro y el personal respondió todas mis preguntas \
                 con paciencia durante la visita",
            )
        })
        .collect()
}

fn polarized_reviews() -> Vec<Review> {
    let mut reviews: Vec<Review> = (0..5)
        .map(|_| review(1, "Muy mala experiencia, no lo recomiendo para nada"))
        .collect();
    reviews.extend((0..5).map(|_| review(5, "Todo excelente, quedamos muy contentos")));
    reviews
}

struct StaticDiscovery {
    agencies: Vec<Agency>,
}

impl DiscoveryProvider for StaticDiscovery {
    async fn search(
        &self,
        _location: Location,
        _radius_meters: u32,
        _keyword: &str,
    ) -> Result<Vec<Agency>, ProviderError> {
        Ok(self.agencies.clone())
    }
}

struct FailingDiscovery;

impl DiscoveryProvider for FailingDiscovery {
    async fn search(
        &self,
        _location: Location,
        _radius_meters: u32,
        _keyword: &str,
    ) -> Result<Vec<Agency>, ProviderError> {
        Err(ProviderError::Api {
            status: "OVER_QUERY_LIMIT".to_string(),
        })
    }
}

/// Review double: canned corpora per place, optional failures, and
/// in-flight tracking to observe the concurrency bound.
#[derive(Default)]
struct MapReviews {
    by_place: HashMap<String, Vec<Review>>,
    failing: Vec<String>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl MapReviews {
    fn with(mut self, place_id: &str, reviews: Vec<Review>) -> Self {
        self.by_place.insert(place_id.to_string(), reviews);
        self
    }

    fn failing_for(mut self, place_id: &str) -> Self {
        self.failing.push(place_id.to_string());
        self
    }
}

impl ReviewsProvider for MapReviews {
    async fn fetch_reviews(&self, place_id: &str) -> Result<Vec<Review>, ProviderError> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(10)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.iter().any(|p| p == place_id) {
            return Err(ProviderError::Api {
                status: "UNKNOWN_ERROR".to_string(),
            });
        }
        Ok(self.by_place.get(place_id).cloned().unwrap_or_default())
    }
}

struct StaticResearch;

impl DeepResearchProvider for StaticResearch {
    async fn analyze(
        &self,
        _name: &str,
        _address: &str,
        place_id: &str,
    ) -> Result<serde_json::Value, ProviderError> {
        Ok(json!({ "placeId": place_id, "summary": "investigación simulada" }))
    }
}

struct FailingResearch;

impl DeepResearchProvider for FailingResearch {
    async fn analyze(
        &self,
        _name: &str,
        _address: &str,
        _place_id: &str,
    ) -> Result<serde_json::Value, ProviderError> {
        Err(ProviderError::UnexpectedStatus {
            status: 502,
            url: "https://research.example.com/analyze".to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Terminal discovery outcomes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn zero_discovery_results_is_a_terminal_error() {
    let pipeline = AnalysisPipeline::new(
        StaticDiscovery { agencies: vec![] },
        MapReviews::default(),
        loader(),
        PipelineConfig::default(),
    );

    let result = pipeline.run("agencias toyota", USER).await;
    assert!(
        matches!(result, Err(PipelineError::NoCandidates { ref query }) if query == "agencias toyota"),
        "got: {result:?}"
    );
}

#[tokio::test]
async fn discovery_failures_propagate() {
    let pipeline = AnalysisPipeline::new(
        FailingDiscovery,
        MapReviews::default(),
        loader(),
        PipelineConfig::default(),
    );

    let result = pipeline.run("agencias", USER).await;
    assert!(matches!(result, Err(PipelineError::Discovery(_))), "got: {result:?}");
}

// ---------------------------------------------------------------------------
// Pre-filter, cap, and batching
// ---------------------------------------------------------------------------

#[tokio::test]
async fn low_rated_and_unrated_candidates_are_filtered_before_fetching() {
    let mut agencies = vec![
        agency("low", "Agencia Baja", Some(2.4)),
        agency("none", "Agencia Sin Rating", None),
    ];
    agencies.extend((0..11).map(|i| agency(&format!("ok{i}"), &format!("Agencia {i}"), Some(4.2))));

    let pipeline = AnalysisPipeline::new(
        StaticDiscovery { agencies },
        MapReviews::default(),
        loader(),
        PipelineConfig::default(),
    );

    let result = pipeline.run("agencias", USER).await.unwrap();
    assert_eq!(result.metadata.total_found, 13);
    assert_eq!(
        result.metadata.total_processed, 10,
        "quality gate drops 3, the cap trims the rest to maxAgencies"
    );
    assert!(result
        .agencies
        .iter()
        .all(|r| r.agency.place_id.starts_with("ok")));
}

#[tokio::test]
async fn review_fetches_never_exceed_the_batch_size() {
    let agencies: Vec<Agency> = (0..9)
        .map(|i| agency(&format!("p{i}"), &format!("Agencia {i}"), Some(4.0)))
        .collect();
    let reviews = MapReviews::default();
    let max_in_flight = Arc::clone(&reviews.max_in_flight);

    let pipeline = AnalysisPipeline::new(
        StaticDiscovery { agencies },
        reviews,
        loader(),
        PipelineConfig::default(),
    );

    pipeline.run("agencias", USER).await.unwrap();
    let observed = max_in_flight.load(Ordering::SeqCst);
    assert!(
        observed <= 3,
        "at most batch_size fetches may be in flight, observed {observed}"
    );
    assert!(observed > 1, "batch members must actually run concurrently");
}

// ---------------------------------------------------------------------------
// Partial failure isolation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn one_failing_fetch_drops_only_that_candidate_without_fallback() {
    let agencies: Vec<Agency> = (0..4)
        .map(|i| agency(&format!("p{i}"), &format!("Agencia {i}"), Some(4.0)))
        .collect();
    let reviews = MapReviews::default()
        .with("p0", detailed_reviews(5, 8))
        .with("p1", detailed_reviews(4, 8))
        .with("p3", detailed_reviews(4, 8))
        .failing_for("p2");

    let pipeline = AnalysisPipeline::new(
        StaticDiscovery { agencies },
        reviews,
        loader(),
        PipelineConfig {
            fallback_without_reviews: false,
            ..PipelineConfig::default()
        },
    );

    let result = pipeline.run("agencias", USER).await.unwrap();
    assert_eq!(result.metadata.total_processed, 3);
    assert_eq!(result.agencies.len(), 3);
    assert_eq!(result.metadata.errors.len(), 1);
    assert!(
        result.metadata.errors[0].contains("Agencia 2"),
        "the error must name the dropped candidate: {:?}",
        result.metadata.errors
    );
}

#[tokio::test]
async fn failing_fetch_with_fallback_keeps_the_candidate_scored_on_empty_reviews() {
    let agencies: Vec<Agency> = (0..6)
        .map(|i| agency(&format!("p{i}"), &format!("Agencia {i}"), Some(4.0)))
        .collect();
    let mut reviews = MapReviews::default().failing_for("p4");
    for i in [0usize, 1, 2, 3, 5] {
        reviews = reviews.with(&format!("p{i}"), detailed_reviews(4, 8));
    }

    let pipeline = AnalysisPipeline::new(
        StaticDiscovery { agencies },
        reviews,
        loader(),
        PipelineConfig::default(),
    );

    let result = pipeline.run("agencias", USER).await.unwrap();
    assert_eq!(result.metadata.total_processed, 6, "nobody is dropped");

    let degraded = result
        .agencies
        .iter()
        .find(|r| r.agency.name == "Agencia 4")
        .expect("the degraded candidate must still be ranked");
    assert_eq!(degraded.reviews_count, 0);
    assert_eq!(degraded.trust_analysis.trust_score, 50);

    assert!(result
        .metadata
        .errors
        .iter()
        .any(|e| e.contains("Agencia 4") && e.contains("reseñas")));
    assert_eq!(result.metadata.total_with_reviews, 5);
}

// ---------------------------------------------------------------------------
// Validation gate
// ---------------------------------------------------------------------------

#[tokio::test]
async fn non_automotive_candidates_are_rejected_with_a_reason() {
    let agencies = vec![
        agency("autos", "Autos del Valle", Some(4.0)),
        agency("motos", "Rodando Dos Ruedas", Some(4.0)),
    ];
    let moto_reviews: Vec<Review> = (0..6)
        .map(|_| review(4, "Compré una moto italika y el scooter de mi esposa aquí mismo"))
        .collect();
    let reviews = MapReviews::default()
        .with("autos", detailed_reviews(4, 8))
        .with("motos", moto_reviews);

    let pipeline = AnalysisPipeline::new(
        StaticDiscovery { agencies },
        reviews,
        loader(),
        PipelineConfig::default(),
    );

    let result = pipeline.run("agencias", USER).await.unwrap();
    assert_eq!(result.metadata.total_processed, 1);
    assert_eq!(result.agencies[0].agency.place_id, "autos");
    assert!(result
        .metadata
        .errors
        .iter()
        .any(|e| e.contains("Rodando Dos Ruedas") && e.contains("excluido por validación")));
}

// ---------------------------------------------------------------------------
// Ranking
// ---------------------------------------------------------------------------

#[tokio::test]
async fn results_are_sorted_by_trust_score_descending() {
    let agencies = vec![
        agency("weak", "Agencia Polarizada", Some(3.5)),
        agency("mid", "Agencia Media", Some(4.0)),
        agency("strong", "Agencia Fuerte", Some(4.8)),
    ];
    let reviews = MapReviews::default()
        .with("weak", polarized_reviews())
        .with("mid", detailed_reviews(4, 10))
        .with("strong", detailed_reviews(5, 40));

    let pipeline = AnalysisPipeline::new(
        StaticDiscovery { agencies },
        reviews,
        loader(),
        PipelineConfig::default(),
    );

    let result = pipeline.run("agencias", USER).await.unwrap();
    let scores: Vec<u8> = result
        .agencies
        .iter()
        .map(|r| r.trust_analysis.trust_score)
        .collect();
    let mut sorted = scores.clone();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    assert_eq!(scores, sorted, "agencies must be sorted by trust desc");
    assert_eq!(result.agencies[0].agency.place_id, "strong");
    assert_eq!(result.agencies[2].agency.place_id, "weak");
}

#[tokio::test]
async fn equal_scores_keep_discovery_order() {
    // No reviews anywhere: every candidate lands on the neutral 50.
    let agencies = vec![
        agency("a", "Primera", Some(4.0)),
        agency("b", "Segunda", Some(4.0)),
        agency("c", "Tercera", Some(4.0)),
    ];

    let pipeline = AnalysisPipeline::new(
        StaticDiscovery { agencies },
        MapReviews::default(),
        loader(),
        PipelineConfig::default(),
    );

    let result = pipeline.run("agencias", USER).await.unwrap();
    let order: Vec<&str> = result
        .agencies
        .iter()
        .map(|r| r.agency.place_id.as_str())
        .collect();
    assert_eq!(order, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn distances_are_rounded_to_two_decimals() {
    let agencies = vec![agency("a", "Agencia", Some(4.0))];
    let pipeline = AnalysisPipeline::new(
        StaticDiscovery { agencies },
        MapReviews::default(),
        loader(),
        PipelineConfig::default(),
    );

    let result = pipeline.run("agencias", USER).await.unwrap();
    let d = result.agencies[0].distance_km;
    assert!(d > 0.0);
    assert!(((d * 100.0).round() - d * 100.0).abs() < f64::EPSILON);
}

// ---------------------------------------------------------------------------
// Deep analysis
// ---------------------------------------------------------------------------

#[tokio::test]
async fn deep_analysis_augments_at_most_three_top_results() {
    let agencies: Vec<Agency> = (0..5)
        .map(|i| agency(&format!("p{i}"), &format!("Agencia {i}"), Some(4.0)))
        .collect();

    let pipeline = AnalysisPipeline::new(
        StaticDiscovery { agencies },
        MapReviews::default(),
        loader(),
        PipelineConfig {
            deep_analysis_enabled: true,
            deep_analysis_min_trust: 30,
            ..PipelineConfig::default()
        },
    )
    .with_research(StaticResearch);

    let result = pipeline.run("agencias", USER).await.unwrap();
    assert_eq!(result.metadata.total_with_deep_analysis, 3);
    let augmented = result
        .agencies
        .iter()
        .filter(|r| r.deep_analysis.is_some())
        .count();
    assert_eq!(augmented, 3);
    // The augmented entries are the top-ranked ones.
    assert!(result.agencies[0].deep_analysis.is_some());
    assert!(result.agencies[4].deep_analysis.is_none());
}

#[tokio::test]
async fn deep_analysis_respects_the_trust_floor() {
    let agencies = vec![agency("a", "Agencia", Some(4.0))];
    let pipeline = AnalysisPipeline::new(
        StaticDiscovery { agencies },
        MapReviews::default(),
        loader(),
        PipelineConfig {
            deep_analysis_enabled: true,
            deep_analysis_min_trust: 80,
            ..PipelineConfig::default()
        },
    )
    .with_research(StaticResearch);

    let result = pipeline.run("agencias", USER).await.unwrap();
    assert_eq!(result.metadata.total_with_deep_analysis, 0);
    assert!(result.agencies[0].deep_analysis.is_none());
}

#[tokio::test]
async fn deep_analysis_failures_never_block_ranking() {
    let agencies = vec![
        agency("a", "Primera", Some(4.0)),
        agency("b", "Segunda", Some(4.0)),
    ];
    let pipeline = AnalysisPipeline::new(
        StaticDiscovery { agencies },
        MapReviews::default(),
        loader(),
        PipelineConfig {
            deep_analysis_enabled: true,
            deep_analysis_min_trust: 30,
            ..PipelineConfig::default()
        },
    )
    .with_research(FailingResearch);

    let result = pipeline.run("agencias", USER).await.unwrap();
    assert_eq!(result.metadata.total_processed, 2);
    assert_eq!(result.metadata.total_with_deep_analysis, 0);
    assert!(result.agencies.iter().all(|r| r.deep_analysis.is_none()));
    assert_eq!(
        result
            .metadata
            .errors
            .iter()
            .filter(|e| e.contains("análisis profundo"))
            .count(),
        2
    );
}

#[tokio::test]
async fn deep_analysis_disabled_means_no_augmentation() {
    let agencies = vec![agency("a", "Agencia", Some(4.0))];
    let pipeline = AnalysisPipeline::new(
        StaticDiscovery { agencies },
        MapReviews::default(),
        loader(),
        PipelineConfig::default(),
    )
    .with_research(StaticResearch);

    let result = pipeline.run("agencias", USER).await.unwrap();
    assert_eq!(result.metadata.total_with_deep_analysis, 0);
    assert!(result.agencies[0].deep_analysis.is_none());
}

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

#[tokio::test]
async fn metadata_counts_reflect_the_run() {
    let agencies = vec![
        agency("a", "Primera", Some(4.0)),
        agency("b", "Segunda", Some(4.0)),
    ];
    let reviews = MapReviews::default().with("a", detailed_reviews(4, 8));

    let pipeline = AnalysisPipeline::new(
        StaticDiscovery { agencies },
        reviews,
        loader(),
        PipelineConfig::default(),
    );

    let result = pipeline.run("agencias", USER).await.unwrap();
    assert_eq!(result.metadata.total_found, 2);
    assert_eq!(result.metadata.total_processed, 2);
    assert_eq!(result.metadata.total_with_reviews, 1);
    assert!(result.metadata.execution_time_ms > 0);
    for r in &result.agencies {
        assert_eq!(r.reviews_count, r.reviews.len());
    }
}
