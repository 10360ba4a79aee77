//! Analysis orchestration for confiauto.
//!
//! Ties discovery, per-candidate review fetching, validation, trust scoring,
//! distance computation, ranking, and optional deep-research augmentation
//! into one pipeline with bounded concurrency and per-candidate failure
//! isolation. [`service::AnalysisService`] wraps the pipeline behind the
//! semantic cache and is the single produced "analyze" operation.

pub mod error;
pub mod pipeline;
pub mod providers;
mod retry;
pub mod service;
pub mod types;

pub use error::{PipelineError, ProviderError};
pub use pipeline::{AnalysisPipeline, DisabledResearch, PipelineConfig};
pub use providers::places::{PlacesClient, PlacesConfig};
pub use providers::research::ResearchClient;
pub use providers::{compose_keyword, DeepResearchProvider, DiscoveryProvider, ReviewsProvider};
pub use service::AnalysisService;
pub use types::{AnalysisResult, PipelineMetadata, PipelineResult};
