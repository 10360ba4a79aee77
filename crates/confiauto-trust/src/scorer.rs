//! Trust score aggregation over a review corpus.

use confiauto_core::Review;

use crate::types::{TrustAnalysis, TrustLevel};

/// Review texts longer than this count as "detailed".
const DETAILED_TEXT_CHARS: usize = 80;

/// Rating spread above this flags a polarized corpus.
const POLARIZATION_STDDEV: f64 = 1.5;

/// Score an agency's review corpus into a bounded trust analysis.
///
/// Deterministic for a given review set. Weighted positive components
/// (mean rating up to 70, volume up to 15, text detail up to 10) minus
/// pattern deductions (polarized ratings, heavy 1-star share, suspiciously
/// uniform 5-star walls). Each deduction or bonus that fires emits a short
/// Spanish flag for display; flags never contain review text and are never
/// fed back into scoring.
///
/// An empty corpus scores a neutral 50 (`media`) with an explanatory red
/// flag, so the continue-without-reviews fallback path yields a stable
/// mid-table entry instead of a winner or an automatic drop.
#[must_use]
pub fn score_trust(reviews: &[Review]) -> TrustAnalysis {
    if reviews.is_empty() {
        return TrustAnalysis {
            trust_score: 50,
            trust_level: TrustLevel::from_score(50),
            red_flags: vec!["Sin reseñas para evaluar confianza".to_string()],
            green_flags: Vec::new(),
        };
    }

    let mut red_flags = Vec::new();
    let mut green_flags = Vec::new();

    #[allow(clippy::cast_precision_loss)]
    let count = reviews.len() as f64;
    let mean = reviews.iter().map(|r| f64::from(r.rating)).sum::<f64>() / count;

    let variance = reviews
        .iter()
        .map(|r| (f64::from(r.rating) - mean).powi(2))
        .sum::<f64>()
        / count;
    let stddev = variance.sqrt();

    let one_star_share =
        reviews.iter().filter(|r| r.rating == 1).count() as f64 / count;
    let five_star_share =
        reviews.iter().filter(|r| r.rating == 5).count() as f64 / count;
    let detail_share = reviews
        .iter()
        .filter(|r| r.text.chars().count() > DETAILED_TEXT_CHARS)
        .count() as f64
        / count;

    let mut score = mean / 5.0 * 70.0;
    score += (count.min(100.0) / 100.0) * 15.0;
    score += detail_share * 10.0;

    if stddev > POLARIZATION_STDDEV {
        score -= 10.0;
        red_flags.push("Opiniones muy polarizadas entre clientes".to_string());
    }
    if one_star_share > 0.3 {
        score -= 15.0;
        red_flags.push("Alta proporción de reseñas de una estrella".to_string());
    }
    if reviews.len() >= 10 && five_star_share > 0.9 {
        score -= 10.0;
        red_flags.push("Patrón de calificaciones uniformemente perfectas".to_string());
    }

    if mean >= 4.5 && reviews.len() >= 20 {
        green_flags.push("Calificación sobresaliente sostenida".to_string());
    }
    if detail_share > 0.5 {
        green_flags.push("Reseñas detalladas y descriptivas".to_string());
    }
    if reviews.len() >= 100 {
        green_flags.push("Gran volumen de reseñas".to_string());
    }
    if one_star_share == 0.0 && reviews.len() >= 10 {
        green_flags.push("Sin reseñas de una estrella".to_string());
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let trust_score = score.clamp(0.0, 100.0).round() as u8;

    TrustAnalysis {
        trust_score,
        trust_level: TrustLevel::from_score(trust_score),
        red_flags,
        green_flags,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(rating: u8, text: &str) -> Review {
        Review {
            author: "Cliente".to_string(),
            rating,
            text: text.to_string(),
            time: 1_700_000_000,
            relative_time_description: "hace un mes".to_string(),
        }
    }

    fn detailed(rating: u8) -> Review {
        review(
            rating,
            "Compré una camioneta seminueva, el trato fue claro, revisaron la factura \
             y el kilometraje sin problema alguno.",
        )
    }

    #[test]
    fn empty_corpus_scores_neutral_media() {
        let analysis = score_trust(&[]);
        assert_eq!(analysis.trust_score, 50);
        assert_eq!(analysis.trust_level, TrustLevel::Media);
        assert_eq!(analysis.red_flags.len(), 1);
        assert!(analysis.green_flags.is_empty());
    }

    #[test]
    fn scoring_is_deterministic() {
        let reviews: Vec<Review> = (0..30)
            .map(|i| review(1 + (i % 5) as u8, "Servicio variable según el vendedor"))
            .collect();
        let first = score_trust(&reviews);
        let second = score_trust(&reviews);
        assert_eq!(first.trust_score, second.trust_score);
        assert_eq!(first.red_flags, second.red_flags);
        assert_eq!(first.green_flags, second.green_flags);
    }

    #[test]
    fn score_always_within_bounds() {
        for rating in 1..=5u8 {
            for n in [1usize, 3, 10, 50, 150] {
                let reviews: Vec<Review> = (0..n).map(|_| detailed(rating)).collect();
                let analysis = score_trust(&reviews);
                assert!(analysis.trust_score <= 100);
                assert_eq!(
                    analysis.trust_level,
                    TrustLevel::from_score(analysis.trust_score)
                );
            }
        }
    }

    #[test]
    fn strong_corpus_reaches_high_trust_with_green_flags() {
        let mut reviews: Vec<Review> = (0..45).map(|_| detailed(5)).collect();
        reviews.extend((0..5).map(|_| detailed(4)));
        let analysis = score_trust(&reviews);
        assert!(
            analysis.trust_level >= TrustLevel::Alta,
            "expected alta or better, got {:?} (score {})",
            analysis.trust_level,
            analysis.trust_score
        );
        assert!(analysis
            .green_flags
            .iter()
            .any(|f| f.contains("sobresaliente")));
    }

    #[test]
    fn polarized_ratings_are_flagged_and_penalized() {
        let mut reviews: Vec<Review> = (0..10).map(|_| review(5, "Excelente agencia")).collect();
        reviews.extend((0..10).map(|_| review(1, "Pésima experiencia")));
        let analysis = score_trust(&reviews);
        assert!(analysis.red_flags.iter().any(|f| f.contains("polarizadas")));
        assert!(analysis
            .red_flags
            .iter()
            .any(|f| f.contains("una estrella")));
        assert!(analysis.trust_level <= TrustLevel::Media);
    }

    #[test]
    fn uniform_five_star_wall_is_flagged() {
        let reviews: Vec<Review> = (0..25).map(|_| review(5, "Excelente")).collect();
        let analysis = score_trust(&reviews);
        assert!(analysis
            .red_flags
            .iter()
            .any(|f| f.contains("uniformemente perfectas")));
    }

    #[test]
    fn flags_never_contain_review_text() {
        let marker = "texto-centinela-unico";
        let reviews: Vec<Review> = (0..12).map(|_| review(1, marker)).collect();
        let analysis = score_trust(&reviews);
        for flag in analysis.red_flags.iter().chain(analysis.green_flags.iter()) {
            assert!(!flag.contains(marker), "flag leaked review text: {flag}");
        }
    }

    #[test]
    fn more_reviews_never_lower_volume_component() {
        let small: Vec<Review> = (0..5).map(|_| detailed(4)).collect();
        let large: Vec<Review> = (0..80).map(|_| detailed(4)).collect();
        assert!(score_trust(&large).trust_score >= score_trust(&small).trust_score);
    }
}
