//! Validation and enqueue logic for discovery runs (§4.9). Handlers call
//! into this module; nothing here knows about HTTP.

use std::sync::Arc;

use extraction::types::{DiscoveryContext, DiscoveryRun, SubscriptionTier};
use extraction::traits::CompetitorStore;
use tracing::info;
use uuid::Uuid;

use crate::common::error::ApiError;
use crate::kernel::jobs::JobQueue;
use crate::kernel::ProjectLookup;

const DEFAULT_MAX_RESULTS: u32 = 10;

pub struct CreateRunInput {
    pub project_id: Uuid,
    pub organization_id: Uuid,
    pub user_id: Uuid,
    pub tier: SubscriptionTier,
    pub keywords: Vec<String>,
    pub regions: Vec<String>,
    pub industries: Vec<String>,
    pub max_results: Option<u32>,
}

pub async fn create_run(
    input: CreateRunInput,
    store: &dyn CompetitorStore,
    projects: &dyn ProjectLookup,
    queue: &JobQueue,
    job_max_attempts: u32,
) -> Result<DiscoveryRun, ApiError> {
    if input.keywords.is_empty() {
        return Err(ApiError::validation("keywords must not be empty"));
    }
    if input.regions.is_empty() {
        return Err(ApiError::validation("regions must not be empty"));
    }

    let project = projects
        .get(input.project_id, input.organization_id)
        .await
        .map_err(|_| ApiError::AuthorizationScope)?;

    let run = store
        .create_run(input.project_id, input.user_id, &input.keywords, &input.regions)
        .await?;

    let context = DiscoveryContext {
        run_id: run.id,
        project_id: project.id,
        organization_id: input.organization_id,
        user_id: input.user_id,
        project_name: project.name,
        project_description: project.description,
        keywords: input.keywords,
        regions: input.regions,
        industries: input.industries,
        max_results: input.max_results.unwrap_or(DEFAULT_MAX_RESULTS),
        tier: input.tier,
    };

    queue.enqueue(&context, job_max_attempts).await.map_err(|e| {
        ApiError::Internal(format!("failed to enqueue discovery job: {e}"))
    })?;

    info!(run_id = %run.id, project_id = %input.project_id, "discovery run enqueued");
    Ok(run)
}

pub async fn get_run(
    run_id: Uuid,
    organization_id: Uuid,
    store: &dyn CompetitorStore,
    projects: &dyn ProjectLookup,
) -> Result<DiscoveryRun, ApiError> {
    let run = store.get_run(run_id).await?;
    projects
        .get(run.project_id, organization_id)
        .await
        .map_err(|_| ApiError::NotFound(run_id.to_string()))?;
    Ok(run)
}

pub async fn list_runs(
    project_id: Uuid,
    organization_id: Uuid,
    store: &dyn CompetitorStore,
    projects: &dyn ProjectLookup,
) -> Result<Vec<DiscoveryRun>, ApiError> {
    projects
        .get(project_id, organization_id)
        .await
        .map_err(|_| ApiError::AuthorizationScope)?;
    Ok(store.list_runs_for_project(project_id, 20).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::project_lookup::mock::InMemoryProjectLookup;
    use crate::kernel::ProjectSummary;
    use extraction::traits::store::mock::InMemoryStore;

    fn project(id: Uuid, org: Uuid) -> ProjectSummary {
        ProjectSummary {
            id,
            organization_id: org,
            name: "Acme".into(),
            description: "widgets".into(),
            keywords: vec![],
            industries: vec![],
            regions: vec![],
        }
    }

    #[tokio::test]
    async fn empty_keywords_rejected_before_run_created() {
        let store = InMemoryStore::new();
        let projects = InMemoryProjectLookup::new();
        let project_id = Uuid::new_v4();
        let org_id = Uuid::new_v4();
        projects.insert(project(project_id, org_id));

        let input = CreateRunInput {
            project_id,
            organization_id: org_id,
            user_id: Uuid::new_v4(),
            tier: SubscriptionTier::Free,
            keywords: vec![],
            regions: vec!["US".into()],
            industries: vec![],
            max_results: None,
        };

        let pool = sqlx::PgPool::connect_lazy("postgres://localhost/unused").unwrap();
        let queue = JobQueue::new(pool);
        let result = create_run(input, &store, &projects, &queue, 2).await;
        assert!(matches!(result, Err(ApiError::Validation(_))));
        assert!(store.runs.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn project_outside_organization_is_authorization_scope() {
        let store = InMemoryStore::new();
        let projects = InMemoryProjectLookup::new();
        let project_id = Uuid::new_v4();
        let owner_org = Uuid::new_v4();
        let other_org = Uuid::new_v4();
        projects.insert(project(project_id, owner_org));

        let result = get_run(Uuid::new_v4(), other_org, &store, &projects).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }
}
