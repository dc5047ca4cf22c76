//! Listing, validation, and enrichment orchestration for persisted
//! competitors (§4.7, §6).

use extraction::enrichment::{enrich, EnrichmentOptions};
use extraction::traits::store::{CompetitorFilter, CompetitorRecord, EnrichmentPatch, ValidationStatus};
use extraction::traits::{AiClient, CompetitorStore, SearchProvider};
use uuid::Uuid;

use crate::common::error::ApiError;

pub async fn list_competitors(
    organization_id: Uuid,
    filter: CompetitorFilter,
    store: &dyn CompetitorStore,
) -> Result<Vec<CompetitorRecord>, ApiError> {
    Ok(store.list_competitors(organization_id, filter).await?)
}

pub async fn get_competitor(id: Uuid, store: &dyn CompetitorStore) -> Result<CompetitorRecord, ApiError> {
    Ok(store.find_competitor(id).await?)
}

pub async fn validate_competitor(
    id: Uuid,
    status: ValidationStatus,
    validator_id: Uuid,
    store: &dyn CompetitorStore,
) -> Result<CompetitorRecord, ApiError> {
    Ok(store.update_competitor_validation(id, status, validator_id).await?)
}

/// `POST /competitors/:id/enrich` always runs with social media and AI
/// analysis enabled and a crawl depth of 2, per §6.
pub async fn enrich_competitor(
    id: Uuid,
    store: &dyn CompetitorStore,
    search: &dyn SearchProvider,
    ai: &dyn AiClient,
) -> Result<CompetitorRecord, ApiError> {
    let record = store.find_competitor(id).await?;
    if record.basic.website.trim().is_empty() {
        return Err(ApiError::Unprocessable("competitor has no website".into()));
    }

    let options = EnrichmentOptions {
        include_social_media: true,
        include_ai_analysis: true,
        crawl_depth: 2,
    };
    let enriched = enrich(&record.basic.website, Some(record.basic.clone()), options, search, ai).await?;
    Ok(store
        .update_competitor_enrichment(id, EnrichmentPatch { enriched })
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use extraction::traits::ai::mock::MockAiClient;
    use extraction::traits::search::mock::MockSearchProvider;
    use extraction::traits::store::mock::InMemoryStore;
    use extraction::types::BasicCompetitor;

    #[tokio::test]
    async fn enrich_rejects_competitor_without_website() {
        let store = InMemoryStore::new();
        let org_id = Uuid::new_v4();
        let run_id = store.create_run(Uuid::new_v4(), Uuid::new_v4(), &["x".into()], &["US".into()]).await.unwrap().id;
        let ids = store
            .insert_competitors(
                org_id,
                run_id,
                &[BasicCompetitor {
                    name: "Acme".into(),
                    website: String::new(),
                    ..Default::default()
                }],
            )
            .await
            .unwrap();

        let search = MockSearchProvider::new();
        let ai = MockAiClient::default();
        let result = enrich_competitor(ids[0], &store, &search, &ai).await;
        assert!(matches!(result, Err(ApiError::Unprocessable(_))));
    }
}
