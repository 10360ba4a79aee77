//! Business validation for confiauto.
//!
//! Classifies discovered candidates as genuine car agencies (or not) from
//! their name, website, place types, and a sample of customer reviews.
//! Two strategies share one criteria document: the legacy review-percentage
//! validator and the enhanced ratio-based validator with per-facet
//! sub-analyses. Both are pure functions over an explicit
//! [`confiauto_core::FilteringCriteria`] — no hidden state, no I/O.

pub mod basic;
pub mod enhanced;
mod keywords;
pub mod types;

pub use basic::{should_process_agency, validate};
pub use enhanced::validate_agency;
pub use types::{
    EnhancedValidationResult, NameAnalysis, ReviewCorpusAnalysis, TypeAnalysis,
    ValidationResult, WebsiteAnalysis,
};
