//! Composes Query Builder → Search Providers (with fallback) → Extractor →
//! Scorer → Deduplicator → Persistence into the discovery job handler.
//! Per-job wall-clock cancellation is the caller's concern (wrap this call
//! in a timeout); everything else recoverable is absorbed here so a
//! completed run with zero results is a normal outcome.

use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

use crate::dedup::{dedup_against_corpus, dedup_within_batch, semantic_dedup};
use crate::error::{PersistenceError, PipelineError, ProviderError};
use crate::extractor::{extract_basic, ExtractionContext};
use crate::providers::ai_fallback;
use crate::query_builder;
use crate::scorer::{score, ScoringContext, DEFAULT_RELEVANCE_THRESHOLD};
use crate::traits::search::{SearchOptions, SearchResult};
use crate::traits::{AiClient, CompetitorStore, SearchProvider};
use crate::types::{BasicCompetitor, DiscoveryContext, Project, RunStatus};

#[derive(Debug, Clone, Copy)]
pub struct DiscoveryConfig {
    pub search_inter_call_ms: u64,
    pub query_inter_call_ms: u64,
    pub relevance_threshold: u8,
    pub fallback_limit: usize,
    pub results_per_query: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            search_inter_call_ms: 500,
            query_inter_call_ms: 1000,
            relevance_threshold: DEFAULT_RELEVANCE_THRESHOLD,
            fallback_limit: 10,
            results_per_query: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DiscoveryOutcome {
    pub results_count: u32,
    pub queries_executed: u32,
}

async fn with_persistence_retry<T, F, Fut>(mut f: F) -> Result<T, PersistenceError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, PersistenceError>>,
{
    let mut attempt = 0;
    loop {
        match f().await {
            Ok(v) => return Ok(v),
            Err(PersistenceError::Transient(msg)) if attempt < 2 => {
                attempt += 1;
                warn!(attempt, error = %msg, "retrying transient persistence error");
                sleep(Duration::from_millis(200 * attempt as u64)).await;
            }
            Err(e) => return Err(e),
        }
    }
}

fn into_pipeline_error(e: PersistenceError) -> PipelineError {
    PipelineError::Persistence(e)
}

/// A single search call, retried up to twice on a transient provider error
/// before the query is skipped.
async fn search_with_retry(
    primary: &dyn SearchProvider,
    query: &str,
    options: SearchOptions,
    inter_call_ms: u64,
) -> Result<Vec<SearchResult>, ProviderError> {
    let mut attempt = 0;
    loop {
        match primary.search(query, options).await {
            Ok(results) => return Ok(results),
            Err(e) if e.is_transient() && attempt < 2 => {
                attempt += 1;
                sleep(Duration::from_millis(inter_call_ms * attempt as u64)).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Run the full discovery pipeline for one job. Returns `Err` only on a
/// fatal persistence failure — every other recoverable failure mode is
/// absorbed and simply shrinks `results_count`.
pub async fn run_discovery(
    context: &DiscoveryContext,
    primary: &dyn SearchProvider,
    ai: &dyn AiClient,
    store: &dyn CompetitorStore,
    config: &DiscoveryConfig,
) -> Result<DiscoveryOutcome, PipelineError> {
    let project = Project {
        id: context.project_id,
        organization_id: context.organization_id,
        name: context.project_name.clone(),
        description: context.project_description.clone(),
        keywords: context.keywords.clone(),
        industries: context.industries.clone(),
        regions: context.regions.clone(),
    };
    let queries = query_builder::build(&project);

    with_persistence_retry(|| store.update_run_status(context.run_id, RunStatus::Searching, None, None))
        .await
        .map_err(into_pipeline_error)?;

    let mut aggregated: Vec<SearchResult> = Vec::new();
    let mut seen_urls: HashSet<String> = HashSet::new();
    let mut stop_primary = !primary.is_available();
    if stop_primary {
        info!("primary search provider unavailable, relying on fallback only");
    }
    let mut queries_executed = 0u32;
    let options = SearchOptions {
        limit: config.results_per_query,
        scrape_content: true,
    };

    for (i, query) in queries.iter().enumerate() {
        queries_executed += 1;
        if !stop_primary {
            match search_with_retry(primary, query, options, config.search_inter_call_ms).await {
                Ok(results) => {
                    for r in results {
                        if seen_urls.insert(r.url.clone()) {
                            aggregated.push(r);
                        }
                    }
                }
                Err(ProviderError::InsufficientCredits) => {
                    warn!("primary search provider exhausted, stopping further primary calls");
                    stop_primary = true;
                }
                Err(e) => {
                    warn!(error = %e, query, "primary search failed for query, skipping");
                }
            }
            sleep(Duration::from_millis(config.search_inter_call_ms)).await;
        }
        if i + 1 < queries.len() {
            sleep(Duration::from_millis(config.query_inter_call_ms)).await;
        }
    }

    if aggregated.is_empty() {
        info!("no primary results, invoking AI fallback provider");
        let fallback_limit = config.fallback_limit.min(context.max_results as usize);
        let fallback_results = ai_fallback::synthesize(
            ai,
            &context.keywords,
            &context.regions,
            context.industries.first().map(|s| s.as_str()),
            fallback_limit,
        )
        .await;
        for r in fallback_results {
            if seen_urls.insert(r.url.clone()) {
                aggregated.push(r);
            }
        }
    }

    if aggregated.is_empty() {
        with_persistence_retry(|| {
            store.update_run_status(context.run_id, RunStatus::Completed, Some(0), None)
        })
        .await
        .map_err(into_pipeline_error)?;
        return Ok(DiscoveryOutcome {
            results_count: 0,
            queries_executed,
        });
    }

    with_persistence_retry(|| store.update_run_status(context.run_id, RunStatus::Extracting, None, None))
        .await
        .map_err(into_pipeline_error)?;

    let extraction_context = ExtractionContext {
        keywords: context.keywords.clone(),
        regions: context.regions.clone(),
        industry: context.industries.first().cloned(),
    };
    let candidates = extract_basic(&aggregated, &extraction_context, ai).await;

    let scoring_context = ScoringContext {
        industries: &context.industries,
        regions: &context.regions,
    };
    let scored: Vec<BasicCompetitor> = candidates
        .into_iter()
        .filter(|c| score(c, &scoring_context) >= config.relevance_threshold)
        .collect();

    let scored = dedup_within_batch(scored);

    let existing_domains = with_persistence_retry(|| store.existing_domains(context.organization_id))
        .await
        .map_err(into_pipeline_error)?;
    let scored = dedup_against_corpus(scored, &existing_domains);

    let mut scored = semantic_dedup(scored, ai, store, context.organization_id).await;
    scored.truncate(context.max_results as usize);

    let inserted = with_persistence_retry(|| {
        store.insert_competitors(context.organization_id, context.run_id, &scored)
    })
    .await
    .map_err(into_pipeline_error)?;

    let results_count = inserted.len() as u32;
    with_persistence_retry(|| {
        store.update_run_status(context.run_id, RunStatus::Completed, Some(results_count), None)
    })
    .await
    .map_err(into_pipeline_error)?;

    Ok(DiscoveryOutcome {
        results_count,
        queries_executed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::ai::mock::MockAiClient;
    use crate::traits::search::mock::MockSearchProvider;
    use crate::traits::search::SearchResult as SR;
    use crate::traits::store::mock::InMemoryStore;
    use crate::types::SubscriptionTier;
    use uuid::Uuid;

    fn context(run_id: Uuid, project_id: Uuid, org_id: Uuid) -> DiscoveryContext {
        DiscoveryContext {
            run_id,
            project_id,
            organization_id: org_id,
            user_id: Uuid::new_v4(),
            project_name: "Acme".to_string(),
            project_description: "a mobile-first challenger bank for francophone Africa".to_string(),
            keywords: vec!["banking".to_string()],
            regions: vec!["NG".to_string()],
            industries: vec!["Fintech".to_string()],
            max_results: 20,
            tier: SubscriptionTier::Premium,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn empty_search_results_complete_with_zero_count() {
        let store = InMemoryStore::new();
        let org_id = Uuid::new_v4();
        let run = store
            .create_run(Uuid::new_v4(), Uuid::new_v4(), &[], &[])
            .await
            .unwrap();
        let ctx = context(run.id, run.project_id, org_id);

        let primary = MockSearchProvider::new();
        let ai = MockAiClient::new();
        let config = DiscoveryConfig::default();

        let outcome = run_discovery(&ctx, &primary, &ai, &store, &config).await.unwrap();
        assert_eq!(outcome.results_count, 0);

        let final_run = store.get_run(run.id).await.unwrap();
        assert_eq!(final_run.status, RunStatus::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn insufficient_credits_stops_primary_and_invokes_fallback() {
        let store = InMemoryStore::new();
        let org_id = Uuid::new_v4();
        let run = store
            .create_run(Uuid::new_v4(), Uuid::new_v4(), &[], &[])
            .await
            .unwrap();
        let ctx = context(run.id, run.project_id, org_id);

        let primary = MockSearchProvider::new().failing_with(ProviderError::InsufficientCredits);
        let ai = MockAiClient::new();
        *ai.synthesized.lock().unwrap() = vec![BasicCompetitor {
            name: "Carbon".into(),
            website: "carbon.ng".into(),
            country: Some("NG".into()),
            industry: Some("Fintech".into()),
            description: Some("digital bank".into()),
            business_model: Some("B2C".into()),
            value_proposition: Some("easy loans".into()),
            founded_year: Some(2019),
            total_funding: Some(5_000_000.0),
        }];
        *ai.complete_response.lock().unwrap() = Some(
            r#"[{"name":"Carbon","website":"carbon.ng","country":"NG","industry":"Fintech","description":"digital bank","business_model":"B2C","value_proposition":"easy loans","founded_year":2019,"total_funding":5000000}]"#
                .to_string(),
        );

        let config = DiscoveryConfig::default();
        let outcome = run_discovery(&ctx, &primary, &ai, &store, &config).await.unwrap();
        assert_eq!(outcome.results_count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn happy_path_scores_extracts_and_persists() {
        let store = InMemoryStore::new();
        let org_id = Uuid::new_v4();
        let run = store
            .create_run(Uuid::new_v4(), Uuid::new_v4(), &[], &[])
            .await
            .unwrap();
        let ctx = context(run.id, run.project_id, org_id);

        let primary = MockSearchProvider::new().with_results(
            "neobank challenger bank mobile banking banking West Africa startup",
            vec![SR::new("https://kuda.com").with_title("Kuda")],
        );
        let ai = MockAiClient::new();
        *ai.complete_response.lock().unwrap() = Some(
            r#"[{"name":"Kuda","website":"kuda.com","country":"NG","industry":"Fintech","description":"digital bank","business_model":"B2C","value_proposition":"free banking","founded_year":2019,"total_funding":55000000}]"#
                .to_string(),
        );

        let config = DiscoveryConfig::default();
        let outcome = run_discovery(&ctx, &primary, &ai, &store, &config).await.unwrap();
        assert_eq!(outcome.results_count, 1);

        let final_run = store.get_run(run.id).await.unwrap();
        assert_eq!(final_run.status, RunStatus::Completed);
        assert_eq!(final_run.results_count, 1);
    }
}
