//! Versioned filtering criteria: document model, loader, TTL cache.
//!
//! The criteria document drives every validation and scoring decision.
//! Reads go through [`CriteriaLoader`], which caches a parsed snapshot for
//! 60 seconds and falls back to the compiled-in defaults when the document
//! is missing, unreadable, or fails validation. Callers always get a usable
//! criteria set; failures are logged, never raised.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::ConfigError;

const CACHE_TTL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilteringCriteria {
    pub version: u32,
    pub last_updated: String,
    #[serde(rename = "businessTypes")]
    pub business_types: BusinessTypes,
    #[serde(rename = "nameKeywords")]
    pub name_keywords: NameKeywords,
    #[serde(rename = "reviewKeywords")]
    pub review_keywords: ReviewKeywords,
    #[serde(rename = "websiteDomains")]
    pub website_domains: WebsiteDomains,
    pub thresholds: Thresholds,
    pub scoring: Scoring,
    pub features: Features,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessTypes {
    #[serde(rename = "validTypes")]
    pub valid_types: Vec<String>,
    #[serde(rename = "forbiddenTypes")]
    pub forbidden_types: Vec<String>,
    #[serde(rename = "motorcycleTypes")]
    pub motorcycle_types: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NameKeywords {
    pub forbidden: Vec<String>,
    #[serde(rename = "motorcycleBrands")]
    pub motorcycle_brands: Vec<String>,
    #[serde(rename = "carBrands")]
    pub car_brands: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewKeywords {
    /// Automotive allow-list; older documents omit it and fall back to the
    /// compiled-in list.
    #[serde(default = "default_automotive_keywords")]
    pub automotive: Vec<String>,
    pub motorcycle: Vec<String>,
    pub rental: Vec<String>,
    #[serde(rename = "serviceOnly")]
    pub service_only: Vec<String>,
    #[serde(rename = "fraudIndicators")]
    pub fraud_indicators: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebsiteDomains {
    pub forbidden: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thresholds {
    #[serde(rename = "minReviewsForAnalysis")]
    pub min_reviews_for_analysis: usize,
    #[serde(rename = "maxReviewsToAnalyze")]
    pub max_reviews_to_analyze: usize,
    /// Review-share ratios above these bounds disqualify outright.
    #[serde(rename = "motorcycleKeywordThreshold")]
    pub motorcycle_keyword_threshold: f64,
    #[serde(rename = "rentalKeywordThreshold")]
    pub rental_keyword_threshold: f64,
    #[serde(rename = "serviceOnlyThreshold")]
    pub service_only_threshold: f64,
    #[serde(rename = "fraudKeywordThreshold")]
    pub fraud_keyword_threshold: f64,
    #[serde(rename = "minRatingForTrusted")]
    pub min_rating_for_trusted: f64,
    #[serde(rename = "minReviewsForTrusted")]
    pub min_reviews_for_trusted: u32,
    #[serde(rename = "minAutomotivePercentage")]
    pub min_automotive_percentage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scoring {
    #[serde(rename = "baseScore")]
    pub base_score: i32,
    #[serde(rename = "ratingMultiplier")]
    pub rating_multiplier: f64,
    #[serde(rename = "reviewCountBonus")]
    pub review_count_bonus: ReviewCountBonus,
    #[serde(rename = "forbiddenDomainPenalty")]
    pub forbidden_domain_penalty: i32,
    #[serde(rename = "fraudKeywordPenalty")]
    pub fraud_keyword_penalty: i32,
    #[serde(rename = "motorcyclePenalty")]
    pub motorcycle_penalty: i32,
    #[serde(rename = "rentalPenalty")]
    pub rental_penalty: i32,
    #[serde(rename = "serviceOnlyPenalty")]
    pub service_only_penalty: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewCountBonus {
    pub min: u32,
    pub max: u32,
    #[serde(rename = "maxBonus")]
    pub max_bonus: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Features {
    #[serde(rename = "includeMotorcycles")]
    pub include_motorcycles: bool,
    #[serde(rename = "includeRentals")]
    pub include_rentals: bool,
    #[serde(rename = "includeServiceOnly")]
    pub include_service_only: bool,
    #[serde(rename = "validateWebsiteDomains")]
    pub validate_website_domains: bool,
    #[serde(rename = "useEnhancedValidation", default = "default_true")]
    pub use_enhanced_validation: bool,
}

fn default_true() -> bool {
    true
}

fn default_automotive_keywords() -> Vec<String> {
    to_strings(&[
        "auto",
        "autos",
        "coche",
        "coches",
        "carro",
        "carros",
        "camioneta",
        "camionetas",
        "seminuevo",
        "seminuevos",
        "agencia",
        "concesionario",
        "vehículo",
        "vehículos",
        "vehiculo",
        "vehiculos",
        "sedán",
        "suv",
        "prueba de manejo",
        "financiamiento",
        "enganche",
        "factura",
        "kilometraje",
    ])
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

impl Default for FilteringCriteria {
    fn default() -> Self {
        Self {
            version: 1,
            last_updated: "2025-01-01".to_string(),
            business_types: BusinessTypes {
                valid_types: to_strings(&["car_dealer", "used_car_dealer", "car_store"]),
                forbidden_types: to_strings(&[
                    "motorcycle_dealer",
                    "bicycle_store",
                    "car_rental",
                    "moving_company",
                ]),
                motorcycle_types: to_strings(&["motorcycle_dealer", "motorcycle_repair"]),
            },
            name_keywords: NameKeywords {
                forbidden: to_strings(&[
                    "motos",
                    "motocicletas",
                    "renta",
                    "bicicletas",
                    "refaccionaria",
                    "grúas",
                    "yonke",
                ]),
                motorcycle_brands: to_strings(&[
                    "italika", "vento", "harley", "ducati", "kawasaki", "yamaha",
                ]),
                car_brands: to_strings(&[
                    "toyota",
                    "nissan",
                    "ford",
                    "chevrolet",
                    "honda",
                    "volkswagen",
                    "kia",
                    "mazda",
                    "hyundai",
                    "bmw",
                    "mercedes",
                    "audi",
                    "seat",
                    "renault",
                    "peugeot",
                    "mitsubishi",
                    "automotriz",
                    "seminuevos",
                ]),
            },
            review_keywords: ReviewKeywords {
                automotive: default_automotive_keywords(),
                motorcycle: to_strings(&[
                    "moto",
                    "motos",
                    "motocicleta",
                    "motoneta",
                    "scooter",
                    "italika",
                ]),
                rental: to_strings(&[
                    "renta",
                    "rentar",
                    "rentamos",
                    "alquiler",
                    "alquilar",
                    "arrendamiento",
                    "por día",
                ]),
                service_only: to_strings(&[
                    "taller",
                    "refacciones",
                    "hojalatería",
                    "pintura",
                    "mecánico",
                    "afinación",
                    "verificación",
                ]),
                fraud_indicators: to_strings(&[
                    "fraude",
                    "estafa",
                    "engaño",
                    "mentirosos",
                    "robo",
                    "denuncia",
                    "profeco",
                    "anticipo",
                    "no devuelven",
                ]),
            },
            website_domains: WebsiteDomains {
                forbidden: to_strings(&[
                    "facebook.com",
                    "mercadolibre.com.mx",
                    "segundamano.mx",
                    "olx.com",
                    "marketplace.com",
                ]),
            },
            thresholds: Thresholds {
                min_reviews_for_analysis: 5,
                max_reviews_to_analyze: 15,
                motorcycle_keyword_threshold: 0.5,
                rental_keyword_threshold: 0.5,
                service_only_threshold: 0.5,
                fraud_keyword_threshold: 0.2,
                min_rating_for_trusted: 4.5,
                min_reviews_for_trusted: 100,
                min_automotive_percentage: 40.0,
            },
            scoring: Scoring {
                base_score: 70,
                rating_multiplier: 2.0,
                review_count_bonus: ReviewCountBonus {
                    min: 50,
                    max: 100,
                    max_bonus: 10,
                },
                forbidden_domain_penalty: 30,
                fraud_keyword_penalty: 30,
                motorcycle_penalty: 40,
                rental_penalty: 40,
                service_only_penalty: 40,
            },
            features: Features {
                include_motorcycles: false,
                include_rentals: false,
                include_service_only: false,
                validate_website_domains: true,
                use_enhanced_validation: true,
            },
        }
    }
}

impl FilteringCriteria {
    /// Effective automotive-percentage acceptance threshold.
    ///
    /// Lowered by 10 points when motorcycles are explicitly included, since
    /// mixed moto/auto dealers then produce legitimately lower percentages.
    #[must_use]
    pub fn effective_min_automotive_percentage(&self) -> f64 {
        if self.features.include_motorcycles {
            (self.thresholds.min_automotive_percentage - 10.0).max(0.0)
        } else {
            self.thresholds.min_automotive_percentage
        }
    }
}

/// Load and validate a filtering criteria document from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_criteria(path: &Path) -> Result<FilteringCriteria, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::CriteriaFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let criteria: FilteringCriteria = serde_yaml::from_str(&content)?;
    validate_criteria(&criteria)?;
    Ok(criteria)
}

fn validate_criteria(criteria: &FilteringCriteria) -> Result<(), ConfigError> {
    if criteria.version == 0 {
        return Err(ConfigError::Validation(
            "criteria version must be at least 1".to_string(),
        ));
    }
    if criteria.review_keywords.automotive.is_empty() {
        return Err(ConfigError::Validation(
            "reviewKeywords.automotive must be non-empty".to_string(),
        ));
    }
    if criteria.name_keywords.car_brands.is_empty() {
        return Err(ConfigError::Validation(
            "nameKeywords.carBrands must be non-empty".to_string(),
        ));
    }
    if criteria.thresholds.max_reviews_to_analyze == 0 {
        return Err(ConfigError::Validation(
            "thresholds.maxReviewsToAnalyze must be at least 1".to_string(),
        ));
    }
    if !(0.0..=100.0).contains(&criteria.thresholds.min_automotive_percentage) {
        return Err(ConfigError::Validation(format!(
            "thresholds.minAutomotivePercentage must be within [0, 100], got {}",
            criteria.thresholds.min_automotive_percentage
        )));
    }
    for (name, ratio) in [
        (
            "motorcycleKeywordThreshold",
            criteria.thresholds.motorcycle_keyword_threshold,
        ),
        (
            "rentalKeywordThreshold",
            criteria.thresholds.rental_keyword_threshold,
        ),
        (
            "serviceOnlyThreshold",
            criteria.thresholds.service_only_threshold,
        ),
        (
            "fraudKeywordThreshold",
            criteria.thresholds.fraud_keyword_threshold,
        ),
    ] {
        if !(0.0..=1.0).contains(&ratio) {
            return Err(ConfigError::Validation(format!(
                "thresholds.{name} must be within [0, 1], got {ratio}"
            )));
        }
    }
    Ok(())
}

struct CachedCriteria {
    criteria: Arc<FilteringCriteria>,
    loaded_at: Instant,
}

/// TTL-cached loader for the filtering criteria document.
///
/// `load` never fails: a missing or invalid document degrades to the
/// compiled-in defaults. Concurrent reloads may race; each writes a complete
/// snapshot, so the last write wins and readers never observe a partial
/// update.
pub struct CriteriaLoader {
    path: PathBuf,
    ttl: Duration,
    state: Mutex<Option<CachedCriteria>>,
}

impl CriteriaLoader {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self::with_ttl(path, CACHE_TTL)
    }

    #[must_use]
    pub fn with_ttl(path: PathBuf, ttl: Duration) -> Self {
        Self {
            path,
            ttl,
            state: Mutex::new(None),
        }
    }

    /// Returns the current criteria snapshot, re-reading the document when
    /// the cached copy is older than the TTL or `force_reload` is set.
    ///
    /// # Panics
    ///
    /// Panics only if the internal mutex is poisoned, which cannot happen
    /// because no code path panics while holding it.
    pub fn load(&self, force_reload: bool) -> Arc<FilteringCriteria> {
        let mut state = self.state.lock().expect("criteria cache mutex poisoned");

        if !force_reload {
            if let Some(cached) = state.as_ref() {
                if cached.loaded_at.elapsed() < self.ttl {
                    return Arc::clone(&cached.criteria);
                }
            }
        }

        let criteria = match load_criteria(&self.path) {
            Ok(criteria) => {
                tracing::debug!(
                    path = %self.path.display(),
                    version = criteria.version,
                    "loaded filtering criteria"
                );
                Arc::new(criteria)
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "failed to load filtering criteria — using built-in defaults"
                );
                Arc::new(FilteringCriteria::default())
            }
        };

        *state = Some(CachedCriteria {
            criteria: Arc::clone(&criteria),
            loaded_at: Instant::now(),
        });
        criteria
    }

    /// Drops the cached snapshot without reading the document.
    ///
    /// # Panics
    ///
    /// Panics only if the internal mutex is poisoned, which cannot happen
    /// because no code path panics while holding it.
    pub fn invalidate(&self) {
        let mut state = self.state.lock().expect("criteria cache mutex poisoned");
        *state = None;
    }
}

impl std::fmt::Debug for CriteriaLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CriteriaLoader")
            .field("path", &self.path)
            .field("ttl", &self.ttl)
            .finish()
    }
}
