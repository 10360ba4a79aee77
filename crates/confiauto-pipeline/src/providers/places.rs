//! HTTP client for the place discovery and review providers.
//!
//! Speaks the Google Places REST wire shape (nearby search + details) but
//! takes an injectable base URL so tests run against a local mock server.
//! Transient failures (429, network errors, 5xx) are retried with
//! exponential back-off and jitter.

use std::time::Duration;

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::Deserialize;

use confiauto_core::{Agency, Location, Review};

use crate::error::ProviderError;
use crate::providers::{DiscoveryProvider, ReviewsProvider};
use crate::retry::retry_with_backoff;

/// Upper bound on reviews returned per place, whatever the provider sends.
const MAX_REVIEWS: usize = 15;

#[derive(Debug, Clone)]
pub struct PlacesConfig {
    pub base_url: String,
    pub api_key: String,
    pub user_agent: String,
    /// Timeout for discovery requests.
    pub search_timeout_secs: u64,
    /// Shorter timeout for per-place review fetches.
    pub reviews_timeout_secs: u64,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
}

/// Client for the place-search and review-fetch collaborators.
pub struct PlacesClient {
    client: reqwest::Client,
    config: PlacesConfig,
}

#[derive(Deserialize)]
struct NearbySearchResponse {
    status: String,
    #[serde(default)]
    results: Vec<PlaceResult>,
}

#[derive(Deserialize)]
struct PlaceResult {
    place_id: String,
    name: String,
    #[serde(default)]
    vicinity: Option<String>,
    geometry: Geometry,
    #[serde(default)]
    rating: Option<f64>,
    #[serde(default)]
    user_ratings_total: Option<u32>,
    #[serde(default)]
    types: Vec<String>,
}

#[derive(Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

#[derive(Deserialize)]
struct DetailsResponse {
    status: String,
    #[serde(default)]
    result: Option<PlaceDetails>,
}

#[derive(Deserialize)]
struct PlaceDetails {
    #[serde(default)]
    reviews: Vec<ReviewResult>,
}

#[derive(Deserialize)]
struct ReviewResult {
    #[serde(default)]
    author_name: String,
    rating: u8,
    #[serde(default)]
    text: String,
    #[serde(default)]
    time: i64,
    #[serde(default)]
    relative_time_description: String,
}

impl PlacesClient {
    /// Creates a client with configured timeouts, `User-Agent`, and retry
    /// policy.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(config: PlacesConfig) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .user_agent(&config.user_agent)
            .build()?;
        Ok(Self { client, config })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        timeout: Duration,
        context: &str,
    ) -> Result<T, ProviderError> {
        let response = self.client.get(url).timeout(timeout).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(30);
            return Err(ProviderError::RateLimited { retry_after_secs });
        }

        if !status.is_success() {
            return Err(ProviderError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str::<T>(&body).map_err(|e| ProviderError::Deserialize {
            context: context.to_string(),
            source: e,
        })
    }

    fn nearby_url(&self, location: Location, radius_meters: u32, keyword: &str) -> String {
        let encoded = utf8_percent_encode(keyword, NON_ALPHANUMERIC).to_string();
        format!(
            "{}/nearbysearch/json?location={},{}&radius={radius_meters}&keyword={encoded}&key={}",
            self.config.base_url, location.lat, location.lng, self.config.api_key
        )
    }

    fn details_url(&self, place_id: &str) -> String {
        let encoded = utf8_percent_encode(place_id, NON_ALPHANUMERIC).to_string();
        format!(
            "{}/details/json?place_id={encoded}&fields=reviews&key={}",
            self.config.base_url, self.config.api_key
        )
    }
}

impl DiscoveryProvider for PlacesClient {
    async fn search(
        &self,
        location: Location,
        radius_meters: u32,
        keyword: &str,
    ) -> Result<Vec<Agency>, ProviderError> {
        let url = self.nearby_url(location, radius_meters, keyword);
        let timeout = Duration::from_secs(self.config.search_timeout_secs);

        let response: NearbySearchResponse = retry_with_backoff(
            self.config.max_retries,
            self.config.backoff_base_ms,
            || self.get_json(&url, timeout, "nearby search"),
        )
        .await?;

        match response.status.as_str() {
            "OK" => {}
            "ZERO_RESULTS" => return Ok(Vec::new()),
            other => {
                return Err(ProviderError::Api {
                    status: other.to_string(),
                })
            }
        }

        tracing::debug!(
            keyword,
            count = response.results.len(),
            "discovery returned candidates"
        );

        Ok(response
            .results
            .into_iter()
            .map(|place| Agency {
                place_id: place.place_id,
                name: place.name,
                address: place.vicinity.unwrap_or_default(),
                location: Location {
                    lat: place.geometry.location.lat,
                    lng: place.geometry.location.lng,
                },
                rating: place.rating,
                total_reviews: place.user_ratings_total,
                phone_number: None,
                website: None,
                opening_hours: None,
                place_types: place.types,
            })
            .collect())
    }
}

impl ReviewsProvider for PlacesClient {
    async fn fetch_reviews(&self, place_id: &str) -> Result<Vec<Review>, ProviderError> {
        let url = self.details_url(place_id);
        let timeout = Duration::from_secs(self.config.reviews_timeout_secs);

        let response: DetailsResponse = retry_with_backoff(
            self.config.max_retries,
            self.config.backoff_base_ms,
            || self.get_json(&url, timeout, "place details"),
        )
        .await?;

        if response.status != "OK" {
            return Err(ProviderError::Api {
                status: response.status,
            });
        }

        let reviews = response
            .result
            .map(|details| details.reviews)
            .unwrap_or_default();

        Ok(reviews
            .into_iter()
            .take(MAX_REVIEWS)
            .map(|r| Review {
                author: r.author_name,
                rating: r.rating.clamp(1, 5),
                text: r.text,
                time: r.time,
                relative_time_description: r.relative_time_description,
            })
            .collect())
    }
}

impl std::fmt::Debug for PlacesClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlacesClient")
            .field("base_url", &self.config.base_url)
            .field("api_key", &"[redacted]")
            .finish_non_exhaustive()
    }
}
