//! Legacy review-percentage validator.
//!
//! Classifies a business from its name plus a relevance-ranked sample of
//! review texts. Insufficient data never blocks: an empty corpus passes
//! through as valid with zero confidence, and the final acceptance policy
//! ([`should_process_agency`]) gives highly-rated or data-poor candidates
//! the benefit of the doubt.

use confiauto_core::{FilteringCriteria, Review};

use crate::keywords::{matched_keywords, whole_word_matches};
use crate::types::ValidationResult;

/// Reviews with at most this many characters carry too little signal to
/// classify and are skipped.
const MIN_TEXT_CHARS: usize = 20;

/// Name-override floor: a car-brand name plus at least this automotive
/// percentage forces acceptance.
const NAME_OVERRIDE_MIN_PERCENTAGE: f64 = 20.0;

/// Validate a business from its name and review sample.
///
/// Pure and idempotent: identical inputs always produce an identical
/// [`ValidationResult`].
#[must_use]
pub fn validate(name: &str, reviews: &[Review], criteria: &FilteringCriteria) -> ValidationResult {
    if reviews.is_empty() {
        return ValidationResult {
            is_valid: true,
            confidence: 0,
            automotive_reviews_count: 0,
            total_reviews_analyzed: 0,
            matched_keywords: Vec::new(),
            excluded_keywords: Vec::new(),
            reason: "Sin reseñas para validar".to_string(),
        };
    }

    let selected = select_relevant_reviews(reviews, criteria.thresholds.max_reviews_to_analyze);
    if selected.is_empty() {
        return ValidationResult {
            is_valid: true,
            confidence: 0,
            automotive_reviews_count: 0,
            total_reviews_analyzed: 0,
            matched_keywords: Vec::new(),
            excluded_keywords: Vec::new(),
            reason: "Sin reseñas con texto suficiente para validar".to_string(),
        };
    }

    let exclusion_lists = exclusion_lists(criteria);

    let mut automotive_count = 0usize;
    let mut all_matched: Vec<String> = Vec::new();
    let mut all_excluded: Vec<String> = Vec::new();

    for review in &selected {
        let automotive = matched_keywords(&review.text, &criteria.review_keywords.automotive);
        let mut excluded: Vec<String> = exclusion_lists
            .iter()
            .flat_map(|list| matched_keywords(&review.text, list))
            .collect();

        // Two or more distinct fraud indicators in one review is a strong
        // signal; they join the exclusion set for that review.
        let fraud = matched_keywords(&review.text, &criteria.review_keywords.fraud_indicators);
        if fraud.len() >= 2 {
            excluded.extend(fraud);
        }

        if automotive.len() > excluded.len() {
            automotive_count += 1;
        }

        extend_distinct(&mut all_matched, automotive);
        extend_distinct(&mut all_excluded, excluded);
    }

    let analyzed = selected.len();
    #[allow(clippy::cast_precision_loss)]
    let automotive_percentage = automotive_count as f64 / analyzed as f64 * 100.0;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let confidence = (automotive_percentage * 1.2).round().min(100.0) as u8;

    let forbidden_hits = whole_word_matches(name, &criteria.name_keywords.forbidden);
    let brand_hits = whole_word_matches(name, &criteria.name_keywords.car_brands);
    let min_percentage = criteria.effective_min_automotive_percentage();

    let (is_valid, reason) = if !forbidden_hits.is_empty() && brand_hits.is_empty() {
        (
            false,
            format!(
                "El nombre contiene el término excluido '{}'",
                forbidden_hits[0]
            ),
        )
    } else if !brand_hits.is_empty() && automotive_percentage >= NAME_OVERRIDE_MIN_PERCENTAGE {
        (
            true,
            format!(
                "Nombre con término automotriz '{}' y {automotive_percentage:.0}% de reseñas automotrices",
                brand_hits[0]
            ),
        )
    } else if automotive_percentage >= min_percentage {
        (
            true,
            format!(
                "{automotive_percentage:.0}% de reseñas automotrices (umbral {min_percentage:.0}%)"
            ),
        )
    } else {
        (
            false,
            format!(
                "Solo {automotive_percentage:.0}% de reseñas automotrices (umbral {min_percentage:.0}%)"
            ),
        )
    };

    ValidationResult {
        is_valid,
        confidence,
        automotive_reviews_count: automotive_count,
        total_reviews_analyzed: analyzed,
        matched_keywords: all_matched,
        excluded_keywords: all_excluded,
        reason,
    }
}

/// Acceptance policy applied after validation.
///
/// A candidate proceeds to scoring when the validator accepted it, when a
/// very high rating offsets middling confidence, or when too few reviews
/// were analyzed to justify a rejection.
#[must_use]
pub fn should_process_agency(validation: &ValidationResult, rating: Option<f64>) -> bool {
    validation.is_valid
        || (rating.is_some_and(|r| r >= 4.5) && validation.confidence >= 25)
        || validation.total_reviews_analyzed < 3
}

/// Rank reviews by classification value and keep the top `max`.
///
/// Longer texts carry more signal (capped), and mid-scale ratings weigh
/// higher than extremes: a 3-star review tends to describe what the
/// business actually does, while 1- and 5-star reviews tend to vent or
/// praise without detail. Stable: ties keep their input order.
fn select_relevant_reviews(reviews: &[Review], max: usize) -> Vec<&Review> {
    let mut candidates: Vec<(&Review, f64)> = reviews
        .iter()
        .filter(|r| r.text.chars().count() > MIN_TEXT_CHARS)
        .map(|r| (r, relevance_score(r)))
        .collect();

    candidates.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    candidates.truncate(max);
    candidates.into_iter().map(|(r, _)| r).collect()
}

fn relevance_score(review: &Review) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let length_score = (review.text.chars().count() as f64 / 100.0).min(3.0);
    let rating_bonus = match review.rating {
        3 => 2.0,
        2 | 4 => 1.0,
        _ => 0.0,
    };
    length_score + rating_bonus
}

/// Keyword lists that count against a review, honoring the feature flags
/// that explicitly include a category.
fn exclusion_lists(criteria: &FilteringCriteria) -> Vec<&Vec<String>> {
    let mut lists = Vec::new();
    if !criteria.features.include_motorcycles {
        lists.push(&criteria.review_keywords.motorcycle);
    }
    if !criteria.features.include_rentals {
        lists.push(&criteria.review_keywords.rental);
    }
    if !criteria.features.include_service_only {
        lists.push(&criteria.review_keywords.service_only);
    }
    lists
}

fn extend_distinct(target: &mut Vec<String>, additions: Vec<String>) {
    for item in additions {
        if !target.contains(&item) {
            target.push(item);
        }
    }
}

#[cfg(test)]
#[path = "basic_test.rs"]
mod tests;
