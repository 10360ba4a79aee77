//! Shared configuration and domain primitives for confiauto.
//!
//! Holds the environment-driven application config, the versioned filtering
//! criteria document (loader with TTL cache and compiled-in defaults), and
//! the value types every other crate consumes: locations, agencies, reviews.

pub mod app_config;
pub mod config;
pub mod criteria;
pub mod error;
pub mod types;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use criteria::{CriteriaLoader, FilteringCriteria};
pub use error::ConfigError;
pub use types::{Agency, Location, Review};
