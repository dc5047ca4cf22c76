//! Infrastructure wiring: dependency container, durable job queue, and the
//! read-only lookup into the external Project/Organization collaborator.
//!
//! Business logic stays in `domains`; this module only assembles the
//! concrete trait implementations the pipeline needs to run.

pub mod jobs;
pub mod project_lookup;
pub mod state;

pub use project_lookup::{ProjectLookup, ProjectSummary};
pub use state::AppState;
