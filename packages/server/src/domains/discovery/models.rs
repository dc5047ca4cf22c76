//! Request/response shapes for the discovery HTTP surface (§6). These are
//! the only place camelCase field names appear; everything past the routes
//! module uses the pipeline's own snake_case types.

use chrono::{DateTime, Utc};
use extraction::types::{DiscoveryRun, RunStatus};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRunRequest {
    /// Parsed by the handler rather than deserialized straight to [`Uuid`],
    /// so a malformed id yields `ApiError::Validation` (400) instead of
    /// axum's default `JsonDataError` rejection (422).
    pub project_id: String,
    pub keywords: Vec<String>,
    pub regions: Vec<String>,
    #[serde(default)]
    pub industries: Vec<String>,
    pub max_results: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRunsQuery {
    pub project_id: Uuid,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResponse {
    pub id: Uuid,
    pub project_id: Uuid,
    pub created_by: Uuid,
    pub status: RunStatus,
    pub keywords: Vec<String>,
    pub regions: Vec<String>,
    pub results_count: u32,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<DiscoveryRun> for RunResponse {
    fn from(run: DiscoveryRun) -> Self {
        Self {
            id: run.id,
            project_id: run.project_id,
            created_by: run.created_by,
            status: run.status,
            keywords: run.keywords,
            regions: run.regions,
            results_count: run.results_count,
            error_message: run.error_message,
            created_at: run.created_at,
            completed_at: run.completed_at,
        }
    }
}
