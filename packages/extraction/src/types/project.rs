use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Owned by exactly one Organization (out of scope here; referenced by id
/// only). Everything the Query Builder needs to produce search queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub description: String,
    pub keywords: Vec<String>,
    pub industries: Vec<String>,
    /// ISO-3166 alpha-2 codes.
    pub regions: Vec<String>,
}
