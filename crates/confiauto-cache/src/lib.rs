//! Two-tier semantic cache for analysis results.
//!
//! Exact-key lookups hit a key-value store ([`store::EntryStore`]); misses
//! fall through to a similarity index ([`index::SimilarityIndex`]) that can
//! return entries cached under merely *similar* queries. Both tiers have a
//! networked implementation (Upstash-style Redis REST, Qdrant + a TEI
//! embedding service) and an in-memory implementation (map with expiries,
//! token-overlap similarity) so the system stays usable with no backends
//! configured.

pub mod embeddings;
pub mod error;
pub mod index;
pub mod key;
pub mod semantic;
pub mod store;
pub mod types;

pub use embeddings::EmbeddingsClient;
pub use error::CacheError;
pub use index::{QdrantIndex, SimilarityIndex, WordOverlapIndex};
pub use semantic::{CacheConfig, SemanticCache};
pub use store::{EntryStore, MemoryStore, RestKvStore};
pub use types::{CacheEntry, CacheLookup, SimilarityHit};
