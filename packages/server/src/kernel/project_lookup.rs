//! Read-only view into the external Project/Organization collaborator.
//!
//! Project and organization CRUD is explicitly out of scope (§1); this
//! trait is the narrow contract the discovery Service needs from that
//! collaborator — enough to verify ownership (§3 invariant: a run's project
//! belongs to the caller's organization) and to snapshot the project's
//! name/description/keywords/industries/regions into the job payload at
//! enqueue time.

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct ProjectSummary {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub description: String,
    pub keywords: Vec<String>,
    pub industries: Vec<String>,
    pub regions: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("project not found")]
    NotFound,
    #[error("lookup failed: {0}")]
    Transport(String),
}

#[async_trait]
pub trait ProjectLookup: Send + Sync {
    /// Fetch the project, or `NotFound` if it doesn't exist or doesn't
    /// belong to `organization_id` — the Service must not distinguish the
    /// two to callers, since that would leak cross-tenant existence.
    async fn get(&self, project_id: Uuid, organization_id: Uuid) -> Result<ProjectSummary, LookupError>;
}

/// Reads the `projects` table owned by the external Project collaborator.
pub struct PostgresProjectLookup {
    pool: PgPool,
}

impl PostgresProjectLookup {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProjectLookup for PostgresProjectLookup {
    async fn get(&self, project_id: Uuid, organization_id: Uuid) -> Result<ProjectSummary, LookupError> {
        let row = sqlx::query(
            "SELECT id, organization_id, name, description, keywords, industries, regions \
             FROM projects WHERE id = $1 AND organization_id = $2",
        )
        .bind(project_id)
        .bind(organization_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| LookupError::Transport(e.to_string()))?;

        let row = row.ok_or(LookupError::NotFound)?;
        Ok(ProjectSummary {
            id: row.try_get("id").map_err(|e| LookupError::Transport(e.to_string()))?,
            organization_id: row
                .try_get("organization_id")
                .map_err(|e| LookupError::Transport(e.to_string()))?,
            name: row.try_get("name").map_err(|e| LookupError::Transport(e.to_string()))?,
            description: row
                .try_get::<Option<String>, _>("description")
                .map_err(|e| LookupError::Transport(e.to_string()))?
                .unwrap_or_default(),
            keywords: row
                .try_get::<Option<Vec<String>>, _>("keywords")
                .map_err(|e| LookupError::Transport(e.to_string()))?
                .unwrap_or_default(),
            industries: row
                .try_get::<Option<Vec<String>>, _>("industries")
                .map_err(|e| LookupError::Transport(e.to_string()))?
                .unwrap_or_default(),
            regions: row
                .try_get::<Option<Vec<String>>, _>("regions")
                .map_err(|e| LookupError::Transport(e.to_string()))?
                .unwrap_or_default(),
        })
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct InMemoryProjectLookup {
        projects: Mutex<HashMap<Uuid, ProjectSummary>>,
    }

    impl InMemoryProjectLookup {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn insert(&self, project: ProjectSummary) {
            self.projects.lock().unwrap().insert(project.id, project);
        }
    }

    #[async_trait]
    impl ProjectLookup for InMemoryProjectLookup {
        async fn get(&self, project_id: Uuid, organization_id: Uuid) -> Result<ProjectSummary, LookupError> {
            self.projects
                .lock()
                .unwrap()
                .get(&project_id)
                .filter(|p| p.organization_id == organization_id)
                .cloned()
                .ok_or(LookupError::NotFound)
        }
    }
}
