use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use confiauto_core::{Agency, Review};
use confiauto_trust::TrustAnalysis;

/// One fully processed agency: trust verdict, review sample, distance, and
/// the optional deep-research payload. Immutable once assembled.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub agency: Agency,
    pub trust_analysis: TrustAnalysis,
    pub reviews: Vec<Review>,
    pub reviews_count: usize,
    pub distance_km: f64,
    /// Opaque payload from the deep-research provider, attached as-is.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deep_analysis: Option<serde_json::Value>,
    pub timestamp: DateTime<Utc>,
}

/// Run-level counters and the accumulated error list.
///
/// Every dropped or degraded candidate leaves a trace here; callers never
/// see a silent count mismatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineMetadata {
    pub total_found: usize,
    pub total_processed: usize,
    pub total_with_reviews: usize,
    pub total_with_deep_analysis: usize,
    pub execution_time_ms: u64,
    pub errors: Vec<String>,
}

/// Final pipeline output: agencies sorted by trust score descending
/// (ties stable by discovery order) plus run metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineResult {
    pub agencies: Vec<AnalysisResult>,
    pub metadata: PipelineMetadata,
}

#[cfg(test)]
mod tests {
    use confiauto_core::Location;
    use confiauto_trust::TrustLevel;

    use super::*;

    #[test]
    fn analysis_result_serializes_the_wire_shape() {
        let result = AnalysisResult {
            agency: Agency {
                place_id: "p1".to_string(),
                name: "Autos del Valle".to_string(),
                address: "Av. Insurgentes 100".to_string(),
                location: Location {
                    lat: 19.0,
                    lng: -99.0,
                },
                rating: Some(4.5),
                total_reviews: Some(80),
                phone_number: None,
                website: None,
                opening_hours: None,
                place_types: vec![],
            },
            trust_analysis: TrustAnalysis {
                trust_score: 72,
                trust_level: TrustLevel::Alta,
                red_flags: vec![],
                green_flags: vec!["Reseñas detalladas y descriptivas".to_string()],
            },
            reviews: vec![],
            reviews_count: 0,
            distance_km: 2.41,
            deep_analysis: None,
            timestamp: Utc::now(),
        };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["trustAnalysis"]["trustScore"], 72);
        assert_eq!(json["trustAnalysis"]["trustLevel"], "alta");
        assert_eq!(json["reviewsCount"], 0);
        assert_eq!(json["distanceKm"], 2.41);
        assert!(json.get("deepAnalysis").is_none());
    }

    #[test]
    fn pipeline_result_round_trips() {
        let result = PipelineResult {
            agencies: vec![],
            metadata: PipelineMetadata {
                total_found: 4,
                total_processed: 3,
                total_with_reviews: 2,
                total_with_deep_analysis: 0,
                execution_time_ms: 120,
                errors: vec!["Agencia X: error al obtener reseñas".to_string()],
            },
        };
        let json = serde_json::to_string(&result).unwrap();
        let back: PipelineResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back.metadata.total_found, 4);
        assert_eq!(back.metadata.errors.len(), 1);
    }
}
