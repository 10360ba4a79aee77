use std::path::PathBuf;

use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files — useful for testing
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual environment
/// so it can be tested with a pure `HashMap` lookup — no `set_var`/`remove_var` needed.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> { lookup(var).ok() };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_f64 = |var: &str, default: &str| -> Result<f64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<f64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_f32 = |var: &str, default: &str| -> Result<f32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<f32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u8 = |var: &str, default: &str| -> Result<u8, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u8>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<bool>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let places_api_key = require("CONFIAUTO_PLACES_API_KEY")?;

    let env = parse_environment(&or_default("CONFIAUTO_ENV", "development"));
    let log_level = or_default("CONFIAUTO_LOG_LEVEL", "info");
    let criteria_path = PathBuf::from(or_default(
        "CONFIAUTO_CRITERIA_PATH",
        "./config/criteria.yaml",
    ));

    let places_base_url = or_default(
        "CONFIAUTO_PLACES_BASE_URL",
        "https://maps.googleapis.com/maps/api/place",
    );
    let user_agent = or_default("CONFIAUTO_USER_AGENT", "confiauto/0.1 (agency-analysis)");

    let request_timeout_secs = parse_u64("CONFIAUTO_REQUEST_TIMEOUT_SECS", "30")?;
    let reviews_timeout_secs = parse_u64("CONFIAUTO_REVIEWS_TIMEOUT_SECS", "10")?;
    let max_retries = parse_u32("CONFIAUTO_MAX_RETRIES", "2")?;
    let retry_backoff_base_ms = parse_u64("CONFIAUTO_RETRY_BACKOFF_BASE_MS", "500")?;

    let search_radius_meters = parse_u32("CONFIAUTO_SEARCH_RADIUS_METERS", "5000")?;
    let min_rating = parse_f64("CONFIAUTO_MIN_RATING", "3.0")?;
    let max_agencies = parse_usize("CONFIAUTO_MAX_AGENCIES", "10")?;
    let batch_size = parse_usize("CONFIAUTO_BATCH_SIZE", "3")?;
    let fallback_without_reviews = parse_bool("CONFIAUTO_FALLBACK_WITHOUT_REVIEWS", "true")?;

    let deep_analysis_enabled = parse_bool("CONFIAUTO_DEEP_ANALYSIS_ENABLED", "false")?;
    let deep_analysis_min_trust = parse_u8("CONFIAUTO_DEEP_ANALYSIS_MIN_TRUST", "30")?;
    let research_base_url = optional("CONFIAUTO_RESEARCH_URL");
    let research_api_key = optional("CONFIAUTO_RESEARCH_API_KEY");

    let cache_rest_url = optional("CONFIAUTO_CACHE_REST_URL");
    let cache_rest_token = optional("CONFIAUTO_CACHE_REST_TOKEN");
    let cache_ttl_secs = parse_u64("CONFIAUTO_CACHE_TTL_SECS", "3600")?;

    let vector_url = optional("CONFIAUTO_VECTOR_URL");
    let vector_collection = or_default("CONFIAUTO_VECTOR_COLLECTION", "confiauto-searches");
    let embed_url = optional("CONFIAUTO_EMBED_URL");
    let similarity_threshold = parse_f32("CONFIAUTO_SIMILARITY_THRESHOLD", "0.85")?;

    if !(0.0..=1.0).contains(&similarity_threshold) {
        return Err(ConfigError::InvalidEnvVar {
            var: "CONFIAUTO_SIMILARITY_THRESHOLD".to_string(),
            reason: format!("must be within [0, 1], got {similarity_threshold}"),
        });
    }

    if batch_size == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "CONFIAUTO_BATCH_SIZE".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    Ok(AppConfig {
        env,
        log_level,
        criteria_path,
        places_api_key,
        places_base_url,
        user_agent,
        request_timeout_secs,
        reviews_timeout_secs,
        max_retries,
        retry_backoff_base_ms,
        search_radius_meters,
        min_rating,
        max_agencies,
        batch_size,
        fallback_without_reviews,
        deep_analysis_enabled,
        deep_analysis_min_trust,
        research_base_url,
        research_api_key,
        cache_rest_url,
        cache_rest_token,
        cache_ttl_secs,
        vector_url,
        vector_collection,
        embed_url,
        similarity_threshold,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}
