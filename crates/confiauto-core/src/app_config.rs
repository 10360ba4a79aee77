use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    /// Path to the versioned filtering criteria document.
    pub criteria_path: PathBuf,

    pub places_api_key: String,
    pub places_base_url: String,
    pub user_agent: String,

    /// Overall per-request timeout for discovery calls.
    pub request_timeout_secs: u64,
    /// Shorter timeout for per-candidate review fetches so one slow place
    /// cannot hang a whole batch.
    pub reviews_timeout_secs: u64,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,

    pub search_radius_meters: u32,
    pub min_rating: f64,
    pub max_agencies: usize,
    pub batch_size: usize,
    /// Keep candidates whose review fetch failed, scoring them on an empty
    /// corpus instead of dropping them.
    pub fallback_without_reviews: bool,

    pub deep_analysis_enabled: bool,
    pub deep_analysis_min_trust: u8,
    pub research_base_url: Option<String>,
    pub research_api_key: Option<String>,

    /// Upstash-style Redis REST endpoint. Absent means the in-memory cache.
    pub cache_rest_url: Option<String>,
    pub cache_rest_token: Option<String>,
    pub cache_ttl_secs: u64,

    /// Qdrant REST endpoint for similarity search. Absent means the
    /// word-overlap fallback.
    pub vector_url: Option<String>,
    pub vector_collection: String,
    pub embed_url: Option<String>,
    pub similarity_threshold: f32,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("criteria_path", &self.criteria_path)
            .field("places_api_key", &"[redacted]")
            .field("places_base_url", &self.places_base_url)
            .field("user_agent", &self.user_agent)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("reviews_timeout_secs", &self.reviews_timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field("search_radius_meters", &self.search_radius_meters)
            .field("min_rating", &self.min_rating)
            .field("max_agencies", &self.max_agencies)
            .field("batch_size", &self.batch_size)
            .field("fallback_without_reviews", &self.fallback_without_reviews)
            .field("deep_analysis_enabled", &self.deep_analysis_enabled)
            .field("deep_analysis_min_trust", &self.deep_analysis_min_trust)
            .field("research_base_url", &self.research_base_url)
            .field(
                "research_api_key",
                &self.research_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("cache_rest_url", &self.cache_rest_url)
            .field(
                "cache_rest_token",
                &self.cache_rest_token.as_ref().map(|_| "[redacted]"),
            )
            .field("cache_ttl_secs", &self.cache_ttl_secs)
            .field("vector_url", &self.vector_url)
            .field("vector_collection", &self.vector_collection)
            .field("embed_url", &self.embed_url)
            .field("similarity_threshold", &self.similarity_threshold)
            .finish()
    }
}
