//! Review-corpus trust scoring for confiauto.
//!
//! Aggregates an agency's reviews into a bounded [0, 100] trust score, a
//! discrete trust level, and short explanatory red/green flags. Scoring is
//! pure and deterministic: the same review set always produces the same
//! analysis.

pub mod scorer;
pub mod types;

pub use scorer::score_trust;
pub use types::{TrustAnalysis, TrustLevel};
