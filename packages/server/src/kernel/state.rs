use std::sync::Arc;

use extraction::ai::OpenAiCompetitorClient;
use extraction::discovery::DiscoveryConfig;
use extraction::providers::PrimarySearchProvider;
use extraction::stores::PostgresCompetitorStore;
use extraction::traits::{AiClient, CompetitorStore, SearchProvider};
use sqlx::PgPool;

use crate::config::Config;
use crate::kernel::jobs::JobQueue;
use crate::kernel::project_lookup::{PostgresProjectLookup, ProjectLookup};

/// Shared dependency container handed to every axum handler and worker
/// task. Every external collaborator is behind a trait object so it can be
/// swapped for an in-memory double in tests.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub store: Arc<dyn CompetitorStore>,
    pub search: Arc<dyn SearchProvider>,
    pub ai: Arc<dyn AiClient>,
    pub projects: Arc<dyn ProjectLookup>,
    pub jobs: Arc<JobQueue>,
    pub discovery_config: DiscoveryConfig,
    pub job_max_attempts: u32,
    pub job_wallclock_seconds: u64,
}

impl AppState {
    /// `queue_pool` is a separate connection when `QUEUE_BACKEND` names a
    /// different database than `STORAGE_URL`; the common case (unset
    /// `QUEUE_BACKEND`) passes the same pool for both.
    pub fn from_config(pool: PgPool, queue_pool: PgPool, config: &Config) -> anyhow::Result<Self> {
        let search = Arc::new(PrimarySearchProvider::new(config.primary_search_api_key.clone()));
        let ai = Arc::new(OpenAiCompetitorClient::new(openai_client::OpenAIClient::new(
            config.chat_model_api_key.clone(),
        )));
        let store = Arc::new(PostgresCompetitorStore::new(pool.clone()));
        let projects = Arc::new(PostgresProjectLookup::new(pool.clone()));
        let jobs = Arc::new(JobQueue::new(queue_pool));

        Ok(Self {
            pool,
            store,
            search,
            ai,
            projects,
            jobs,
            discovery_config: DiscoveryConfig {
                search_inter_call_ms: config.search_inter_call_ms,
                query_inter_call_ms: config.query_inter_call_ms,
                relevance_threshold: config.relevance_threshold,
                ..Default::default()
            },
            job_max_attempts: config.job_max_attempts,
            job_wallclock_seconds: config.job_wallclock_seconds,
        })
    }
}
