//! Typed errors for the discovery pipeline.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling that callers can match on.

use thiserror::Error;

/// Errors that can occur while running part of the discovery pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A search provider call failed or was refused.
    #[error("search provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The chat-completion or embedding collaborator failed.
    #[error("AI service error: {0}")]
    Ai(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Persistence adapter failed.
    #[error("persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// Input validation failed before any work was queued.
    #[error("validation error: {reason}")]
    Validation { reason: String },

    /// The caller's organization does not own the referenced project.
    #[error("project {project_id} is not owned by the caller's organization")]
    AuthorizationScope { project_id: String },

    /// A per-call or per-job wall-clock budget was exceeded.
    #[error("timeout: {0}")]
    Timeout(String),
}

/// Errors surfaced by a [`crate::traits::search::SearchProvider`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The provider's prepaid credits are exhausted; stop calling it this run.
    #[error("search provider has insufficient credits")]
    InsufficientCredits,

    /// The provider is rate-limiting this caller; retry later.
    #[error("search provider rate limited the request")]
    RateLimited,

    /// Network-level failure (DNS, connect, TLS, non-2xx, etc).
    #[error("search provider transport error: {0}")]
    Transport(String),

    /// Provider has no credential configured and was skipped.
    #[error("search provider unavailable: no credential configured")]
    Unavailable,
}

impl ProviderError {
    /// Whether a single failed call should be retried with backoff before
    /// giving up on the query.
    pub fn is_transient(&self) -> bool {
        matches!(self, ProviderError::RateLimited | ProviderError::Transport(_))
    }
}

/// Errors surfaced by a persistence adapter.
///
/// Kinds, not transport codes — callers branch on these to decide whether to
/// retry, skip, or fail the run.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    /// The referenced row does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A unique-constraint conflict; the caller should treat this as
    /// "already known" rather than an error.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A transient infrastructure failure; retry with backoff.
    #[error("transient storage error: {0}")]
    Transient(String),

    /// An unrecoverable failure (schema mismatch, constraint violation
    /// other than the dedup key, etc). Fails the run.
    #[error("fatal storage error: {0}")]
    Fatal(String),
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
