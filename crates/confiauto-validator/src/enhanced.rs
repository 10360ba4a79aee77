//! Enhanced ratio-based validator.
//!
//! Review-driven: when the corpus is large enough, acceptance is decided by
//! the share of reviews mentioning disqualifying categories (motorcycles,
//! rentals, service-only work, fraud), scored from the criteria document's
//! explicit weights. Name, website, and place-type facets are always
//! analyzed and attached for explainability, but they never override a
//! review-driven verdict.

use confiauto_core::{Agency, FilteringCriteria, Review};

use crate::keywords::{domain_matches, domain_of, matched_keywords, whole_word_matches};
use crate::types::{
    EnhancedValidationResult, NameAnalysis, ReviewCorpusAnalysis, TypeAnalysis, WebsiteAnalysis,
};

/// Category ratios above this but below the hard threshold take the soft
/// (half) penalty.
const SOFT_RATIO_BOUND: f64 = 0.3;

/// Fraud ratios above this but below the hard threshold take the soft
/// (half) penalty.
const SOFT_FRAUD_BOUND: f64 = 0.1;

/// Confidence floor for acceptance when enough reviews exist.
const MIN_CONFIDENCE: u8 = 40;

/// Confidence assigned when the corpus is too small to analyze.
const INSUFFICIENT_DATA_CONFIDENCE: u8 = 50;

/// Validate an agency from its full profile plus its review corpus.
#[must_use]
pub fn validate_agency(
    agency: &Agency,
    reviews: &[Review],
    criteria: &FilteringCriteria,
) -> EnhancedValidationResult {
    let name_analysis = analyze_name(&agency.name, criteria);
    let website_analysis = analyze_website(agency.website.as_deref(), criteria);
    let type_analysis = analyze_types(&agency.place_types, criteria);

    let sample: Vec<&Review> = reviews
        .iter()
        .take(criteria.thresholds.max_reviews_to_analyze)
        .collect();
    let review_analysis = analyze_corpus(&sample, criteria);

    let mut failure_reasons = Vec::new();
    if let Some(domain) = &website_analysis.forbidden_match {
        failure_reasons.push(format!("Sitio web en dominio no permitido: {domain}"));
    }

    let mut matched = Vec::new();
    let mut excluded = Vec::new();
    let mut automotive_count = 0usize;
    for review in &sample {
        let hits = matched_keywords(&review.text, &criteria.review_keywords.automotive);
        if !hits.is_empty() {
            automotive_count += 1;
        }
        extend_distinct(&mut matched, hits);
        for list in [
            &criteria.review_keywords.motorcycle,
            &criteria.review_keywords.rental,
            &criteria.review_keywords.service_only,
            &criteria.review_keywords.fraud_indicators,
        ] {
            extend_distinct(&mut excluded, matched_keywords(&review.text, list));
        }
    }

    if reviews.len() < criteria.thresholds.min_reviews_for_analysis {
        // Too little data to reject: explicit low-confidence pass-through.
        return EnhancedValidationResult {
            is_valid: true,
            confidence: INSUFFICIENT_DATA_CONFIDENCE,
            score: i32::from(INSUFFICIENT_DATA_CONFIDENCE),
            automotive_reviews_count: automotive_count,
            total_reviews_analyzed: sample.len(),
            matched_keywords: matched,
            excluded_keywords: excluded,
            reason: format!(
                "Datos insuficientes: menos de {} reseñas, se acepta con confianza baja",
                criteria.thresholds.min_reviews_for_analysis
            ),
            failure_reasons,
            name_analysis,
            website_analysis,
            type_analysis,
            review_analysis,
        };
    }

    let mut score = criteria.scoring.base_score;
    let mut hard_ratio_exceeded = false;

    let categories: [(&str, f64, f64, i32, bool); 3] = [
        (
            "motocicletas",
            review_analysis.motorcycle_ratio,
            criteria.thresholds.motorcycle_keyword_threshold,
            criteria.scoring.motorcycle_penalty,
            criteria.features.include_motorcycles,
        ),
        (
            "renta",
            review_analysis.rental_ratio,
            criteria.thresholds.rental_keyword_threshold,
            criteria.scoring.rental_penalty,
            criteria.features.include_rentals,
        ),
        (
            "solo taller",
            review_analysis.service_only_ratio,
            criteria.thresholds.service_only_threshold,
            criteria.scoring.service_only_penalty,
            criteria.features.include_service_only,
        ),
    ];

    for (label, ratio, hard_threshold, penalty, included) in categories {
        if included {
            continue;
        }
        if ratio > hard_threshold {
            score -= penalty;
            hard_ratio_exceeded = true;
            failure_reasons.push(format!(
                "Mayoría de reseñas sobre {label}: {:.0}%",
                ratio * 100.0
            ));
        } else if ratio > SOFT_RATIO_BOUND {
            score -= penalty / 2;
        }
    }

    let fraud_ratio = review_analysis.fraud_ratio;
    if fraud_ratio > criteria.thresholds.fraud_keyword_threshold {
        score -= criteria.scoring.fraud_keyword_penalty;
        failure_reasons.push(format!(
            "Menciones de fraude en {:.0}% de las reseñas",
            fraud_ratio * 100.0
        ));
    } else if fraud_ratio > SOFT_FRAUD_BOUND {
        score -= criteria.scoring.fraud_keyword_penalty / 2;
    }

    score += rating_bonus(agency.rating, criteria);
    score += volume_bonus(agency.total_reviews, criteria);

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let confidence = score.clamp(0, 100) as u8;

    // Majority non-automotive content disqualifies regardless of score.
    let is_valid = confidence >= MIN_CONFIDENCE && !hard_ratio_exceeded;

    let reason = if is_valid {
        format!("Contenido de reseñas mayormente automotriz (confianza {confidence}%)")
    } else if let Some(first) = failure_reasons.first() {
        first.clone()
    } else {
        format!("Confianza insuficiente ({confidence}%)")
    };

    EnhancedValidationResult {
        is_valid,
        confidence,
        score,
        automotive_reviews_count: automotive_count,
        total_reviews_analyzed: sample.len(),
        matched_keywords: matched,
        excluded_keywords: excluded,
        reason,
        failure_reasons,
        name_analysis,
        website_analysis,
        type_analysis,
        review_analysis,
    }
}

fn analyze_name(name: &str, criteria: &FilteringCriteria) -> NameAnalysis {
    NameAnalysis {
        car_brand_matches: whole_word_matches(name, &criteria.name_keywords.car_brands),
        forbidden_matches: whole_word_matches(name, &criteria.name_keywords.forbidden),
        motorcycle_brand_matches: whole_word_matches(
            name,
            &criteria.name_keywords.motorcycle_brands,
        ),
    }
}

fn analyze_website(website: Option<&str>, criteria: &FilteringCriteria) -> WebsiteAnalysis {
    let domain = website.and_then(domain_of);
    if !criteria.features.validate_website_domains {
        return WebsiteAnalysis {
            domain,
            forbidden_match: None,
            penalty: 0,
        };
    }

    let forbidden_match = domain.as_deref().and_then(|d| {
        criteria
            .website_domains
            .forbidden
            .iter()
            .find(|f| domain_matches(d, f))
            .cloned()
    });
    let penalty = if forbidden_match.is_some() {
        criteria.scoring.forbidden_domain_penalty
    } else {
        0
    };

    WebsiteAnalysis {
        domain,
        forbidden_match,
        penalty,
    }
}

fn analyze_types(place_types: &[String], criteria: &FilteringCriteria) -> TypeAnalysis {
    let intersect = |list: &[String]| -> Vec<String> {
        place_types
            .iter()
            .filter(|t| list.contains(t))
            .cloned()
            .collect()
    };
    TypeAnalysis {
        valid_matches: intersect(&criteria.business_types.valid_types),
        forbidden_matches: intersect(&criteria.business_types.forbidden_types),
        motorcycle_matches: intersect(&criteria.business_types.motorcycle_types),
    }
}

#[allow(clippy::cast_precision_loss)]
fn analyze_corpus(sample: &[&Review], criteria: &FilteringCriteria) -> ReviewCorpusAnalysis {
    let analyzed = sample.len();
    let ratio_for = |list: &[String]| -> f64 {
        if analyzed == 0 {
            return 0.0;
        }
        let matching = sample
            .iter()
            .filter(|r| !matched_keywords(&r.text, list).is_empty())
            .count();
        matching as f64 / analyzed as f64
    };

    ReviewCorpusAnalysis {
        reviews_analyzed: analyzed,
        motorcycle_ratio: ratio_for(&criteria.review_keywords.motorcycle),
        rental_ratio: ratio_for(&criteria.review_keywords.rental),
        service_only_ratio: ratio_for(&criteria.review_keywords.service_only),
        fraud_ratio: ratio_for(&criteria.review_keywords.fraud_indicators),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn rating_bonus(rating: Option<f64>, criteria: &FilteringCriteria) -> i32 {
    let Some(rating) = rating else { return 0 };
    if rating >= criteria.thresholds.min_rating_for_trusted {
        (5.0 * criteria.scoring.rating_multiplier) as i32
    } else if rating >= 4.0 {
        (2.5 * criteria.scoring.rating_multiplier) as i32
    } else {
        0
    }
}

fn volume_bonus(total_reviews: Option<u32>, criteria: &FilteringCriteria) -> i32 {
    let Some(total) = total_reviews else { return 0 };
    let bonus = &criteria.scoring.review_count_bonus;
    if total >= bonus.max {
        bonus.max_bonus
    } else if total >= bonus.min {
        bonus.max_bonus / 2
    } else {
        0
    }
}

fn extend_distinct(target: &mut Vec<String>, additions: Vec<String>) {
    for item in additions {
        if !target.contains(&item) {
            target.push(item);
        }
    }
}
