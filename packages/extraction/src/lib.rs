//! Multi-tenant competitor-discovery pipeline: query building, search
//! fan-out with fallback, AI-assisted structured extraction, relevance
//! scoring, deduplication, and deep single-company enrichment.
//!
//! The worker runtime that schedules and retries discovery jobs lives in
//! the `server` crate; this crate is the pure, testable core it drives.

pub mod dedup;
pub mod discovery;
pub mod enrichment;
pub mod error;
pub mod extractor;
pub mod funding;
pub mod providers;
pub mod query_builder;
pub mod scorer;
pub mod traits;
pub mod types;
mod util;

#[cfg(feature = "openai")]
pub mod ai;

#[cfg(feature = "postgres")]
pub mod stores;

pub use discovery::{run_discovery, DiscoveryConfig, DiscoveryOutcome};
pub use enrichment::{enrich, EnrichmentOptions};
pub use error::{PersistenceError, PipelineError, ProviderError, Result};
