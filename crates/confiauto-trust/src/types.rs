use serde::{Deserialize, Serialize};

/// Discrete trust bucket derived from the trust score.
///
/// Variants are ordered worst-to-best so level comparisons follow score
/// comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustLevel {
    MuyBaja,
    Baja,
    Media,
    Alta,
    MuyAlta,
}

impl TrustLevel {
    /// Step function from score to bucket: ≥85 muy_alta, ≥70 alta,
    /// ≥50 media, ≥30 baja, else muy_baja.
    #[must_use]
    pub fn from_score(score: u8) -> Self {
        match score {
            85.. => TrustLevel::MuyAlta,
            70..=84 => TrustLevel::Alta,
            50..=69 => TrustLevel::Media,
            30..=49 => TrustLevel::Baja,
            _ => TrustLevel::MuyBaja,
        }
    }
}

impl std::fmt::Display for TrustLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrustLevel::MuyAlta => write!(f, "muy_alta"),
            TrustLevel::Alta => write!(f, "alta"),
            TrustLevel::Media => write!(f, "media"),
            TrustLevel::Baja => write!(f, "baja"),
            TrustLevel::MuyBaja => write!(f, "muy_baja"),
        }
    }
}

/// Aggregated trust verdict for one agency's review corpus.
///
/// `red_flags`/`green_flags` are short display strings derived from detected
/// patterns — never raw review text, never inputs to further scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrustAnalysis {
    pub trust_score: u8,
    pub trust_level: TrustLevel,
    pub red_flags: Vec<String>,
    pub green_flags: Vec<String>,
}
