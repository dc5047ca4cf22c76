//! Concrete search backends implementing the pipeline's provider contracts.

pub mod ai_fallback;
pub mod web_search;

pub use web_search::PrimarySearchProvider;
