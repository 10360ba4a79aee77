use serde::{Deserialize, Serialize};

/// Verdict of the legacy review-percentage validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    /// Calibrated confidence in [0, 100].
    pub confidence: u8,
    pub automotive_reviews_count: usize,
    pub total_reviews_analyzed: usize,
    pub matched_keywords: Vec<String>,
    pub excluded_keywords: Vec<String>,
    pub reason: String,
}

/// Name facet of the enhanced analysis (whole-word matches only).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NameAnalysis {
    pub car_brand_matches: Vec<String>,
    pub forbidden_matches: Vec<String>,
    pub motorcycle_brand_matches: Vec<String>,
}

/// Website facet: extracted host and any disallow-list hit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebsiteAnalysis {
    pub domain: Option<String>,
    pub forbidden_match: Option<String>,
    /// Penalty the disallow-list hit carries, for explainability.
    pub penalty: i32,
}

/// Place-type facet: exact matches against the configured type lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeAnalysis {
    pub valid_matches: Vec<String>,
    pub forbidden_matches: Vec<String>,
    pub motorcycle_matches: Vec<String>,
}

/// Review-corpus facet: share of analyzed reviews mentioning each
/// disqualifying category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewCorpusAnalysis {
    pub reviews_analyzed: usize,
    pub motorcycle_ratio: f64,
    pub rental_ratio: f64,
    pub service_only_ratio: f64,
    pub fraud_ratio: f64,
}

/// Verdict of the enhanced validator: the legacy fields plus the signed
/// intermediate score, itemized failure reasons, and per-facet
/// sub-analyses attached for explainability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancedValidationResult {
    pub is_valid: bool,
    /// Always `clamp(score, 0, 100)`.
    pub confidence: u8,
    /// Signed, unbounded intermediate score before clamping.
    pub score: i32,
    pub automotive_reviews_count: usize,
    pub total_reviews_analyzed: usize,
    pub matched_keywords: Vec<String>,
    pub excluded_keywords: Vec<String>,
    pub reason: String,
    pub failure_reasons: Vec<String>,
    pub name_analysis: NameAnalysis,
    pub website_analysis: WebsiteAnalysis,
    pub type_analysis: TypeAnalysis,
    pub review_analysis: ReviewCorpusAnalysis,
}

impl EnhancedValidationResult {
    /// Collapses the enhanced verdict into the legacy shape so downstream
    /// acceptance policies work with either validator.
    #[must_use]
    pub fn summary(&self) -> ValidationResult {
        ValidationResult {
            is_valid: self.is_valid,
            confidence: self.confidence,
            automotive_reviews_count: self.automotive_reviews_count,
            total_reviews_analyzed: self.total_reviews_analyzed,
            matched_keywords: self.matched_keywords.clone(),
            excluded_keywords: self.excluded_keywords.clone(),
            reason: self.reason.clone(),
        }
    }
}
