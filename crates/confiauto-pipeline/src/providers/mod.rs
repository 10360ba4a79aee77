//! External collaborator interfaces and their HTTP client implementations.

pub mod places;
pub mod research;

use confiauto_core::{Agency, Location, Review};

use crate::error::ProviderError;

/// Place discovery: find candidate businesses around a location.
#[allow(async_fn_in_trait)]
pub trait DiscoveryProvider {
    async fn search(
        &self,
        location: Location,
        radius_meters: u32,
        keyword: &str,
    ) -> Result<Vec<Agency>, ProviderError>;
}

/// Per-place review fetching, bounded in count, with its own (shorter)
/// timeout so one slow place cannot stall a batch.
#[allow(async_fn_in_trait)]
pub trait ReviewsProvider {
    async fn fetch_reviews(&self, place_id: &str) -> Result<Vec<Review>, ProviderError>;
}

/// Expensive LLM-driven research applied only to top-ranked candidates.
/// The payload is opaque to the pipeline and attached to results as-is.
#[allow(async_fn_in_trait)]
pub trait DeepResearchProvider {
    async fn analyze(
        &self,
        name: &str,
        address: &str,
        place_id: &str,
    ) -> Result<serde_json::Value, ProviderError>;
}

/// Compose the discovery keyword for a user query.
///
/// The suffix keeps discovery anchored to the car-agency domain even for
/// terse queries like a brand name.
#[must_use]
pub fn compose_keyword(query: &str) -> String {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        "agencia de autos seminuevos".to_string()
    } else {
        format!("{trimmed} agencia de autos")
    }
}
