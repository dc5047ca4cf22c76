use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Subscription tier of the organization on whose behalf work runs.
///
/// Consulted only to decide whether enrichment extras (AI analysis) default
/// on; never used for quota enforcement, which lives outside the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionTier {
    Free,
    Trial,
    Premium,
}

impl SubscriptionTier {
    /// Whether AI analysis should default to enabled for this tier during
    /// enrichment. Free tier gets basic extraction only; Trial and Premium
    /// both get AI analysis by default.
    pub fn ai_analysis_default(&self) -> bool {
        !matches!(self, SubscriptionTier::Free)
    }
}

/// Resolved, explicit tenant context carried through every pipeline call.
///
/// Produced by the auth collaborator (out of scope here) and passed down
/// rather than threaded through query strings or hard-coded ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    pub user_id: Uuid,
    pub organization_id: Uuid,
    pub tier: SubscriptionTier,
}

/// The payload of a `discover` queue job: everything a worker needs to run
/// one discovery job without looking anything else up.
///
/// `project_name`/`project_description` are snapshotted by the Service at
/// enqueue time alongside the keywords/regions snapshot, so the Query
/// Builder never has to reach back out to the Project collaborator from
/// inside a worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryContext {
    pub run_id: Uuid,
    pub project_id: Uuid,
    pub organization_id: Uuid,
    pub user_id: Uuid,
    pub project_name: String,
    pub project_description: String,
    pub keywords: Vec<String>,
    pub regions: Vec<String>,
    pub industries: Vec<String>,
    pub max_results: u32,
    pub tier: SubscriptionTier,
}
