//! Persistence adapter contract. The core never talks to Postgres
//! directly outside the `postgres` feature's implementation of this trait —
//! every pipeline stage goes through it so it can be exercised against an
//! in-memory double.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::PersistenceError;
use crate::types::{BasicCompetitor, DiscoveryRun, EnrichedCompetitor, RunStatus};

/// Validation decision recorded by a human reviewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationStatus {
    Approved,
    Rejected,
}

/// Sparse patch applied by `update_competitor_enrichment`; only `Some`
/// fields are merged, everything else is left untouched.
#[derive(Debug, Clone, Default)]
pub struct EnrichmentPatch {
    pub enriched: EnrichedCompetitor,
}

/// A persisted competitor row, mirroring the `competitors` table shape.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct CompetitorRecord {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub search_run_id: Option<Uuid>,
    pub basic: BasicCompetitor,
    pub enriched: Option<EnrichedCompetitor>,
    pub validation_status: Option<ValidationStatus>,
    pub validated_by: Option<Uuid>,
    pub validated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A near-match returned by semantic dedup / similarity search.
#[derive(Debug, Clone)]
pub struct SimilarCompetitor {
    pub id: Uuid,
    pub similarity: f64,
}

/// Narrowing filters for [`CompetitorStore::list_competitors`]; every field
/// is optional and `None` means "don't filter on this".
#[derive(Debug, Clone, Default)]
pub struct CompetitorFilter {
    pub region: Option<String>,
    pub country: Option<String>,
    pub industry: Option<String>,
    pub validation_status: Option<ValidationStatus>,
    pub search_run_id: Option<Uuid>,
}

#[async_trait]
pub trait CompetitorStore: Send + Sync {
    async fn create_run(
        &self,
        project_id: Uuid,
        user_id: Uuid,
        keywords: &[String],
        regions: &[String],
    ) -> Result<DiscoveryRun, PersistenceError>;

    async fn update_run_status(
        &self,
        run_id: Uuid,
        status: RunStatus,
        results_count: Option<u32>,
        error_message: Option<String>,
    ) -> Result<DiscoveryRun, PersistenceError>;

    async fn get_run(&self, run_id: Uuid) -> Result<DiscoveryRun, PersistenceError>;

    async fn list_runs_for_project(
        &self,
        project_id: Uuid,
        limit: u32,
    ) -> Result<Vec<DiscoveryRun>, PersistenceError>;

    /// Idempotent bulk insert keyed on `(organization_id, normalized
    /// domain(website))`. Conflicts are skipped, not errors; the returned
    /// vector holds only the ids of rows actually inserted.
    async fn insert_competitors(
        &self,
        organization_id: Uuid,
        run_id: Uuid,
        records: &[BasicCompetitor],
    ) -> Result<Vec<Uuid>, PersistenceError>;

    async fn find_competitor(&self, id: Uuid) -> Result<CompetitorRecord, PersistenceError>;

    /// Filtered listing for the organization, newest first. Every filter
    /// field is optional and narrows the result set when present.
    async fn list_competitors(
        &self,
        organization_id: Uuid,
        filter: CompetitorFilter,
    ) -> Result<Vec<CompetitorRecord>, PersistenceError>;

    /// Every normalized domain already on file for the organization, used
    /// by the cross-corpus dedup pass.
    async fn existing_domains(
        &self,
        organization_id: Uuid,
    ) -> Result<Vec<String>, PersistenceError>;

    async fn update_competitor_validation(
        &self,
        id: Uuid,
        status: ValidationStatus,
        validator_id: Uuid,
    ) -> Result<CompetitorRecord, PersistenceError>;

    async fn update_competitor_enrichment(
        &self,
        id: Uuid,
        patch: EnrichmentPatch,
    ) -> Result<CompetitorRecord, PersistenceError>;

    /// Cosine-similarity search over the organization's stored embeddings;
    /// returns only matches strictly above `threshold`.
    async fn match_competitors_by_embedding(
        &self,
        organization_id: Uuid,
        vector: &[f32],
        threshold: f64,
        limit: u32,
    ) -> Result<Vec<SimilarCompetitor>, PersistenceError>;
}

#[cfg(any(test, feature = "testing"))]
pub mod mock {
    use super::*;
    use crate::types::RunStatus;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct InMemoryStore {
        pub runs: Mutex<HashMap<Uuid, DiscoveryRun>>,
        pub competitors: Mutex<HashMap<Uuid, CompetitorRecord>>,
    }

    impl InMemoryStore {
        pub fn new() -> Self {
            Self::default()
        }

        fn normalize(url: &str) -> String {
            crate::dedup::normalize_domain(url)
        }
    }

    #[async_trait]
    impl CompetitorStore for InMemoryStore {
        async fn create_run(
            &self,
            project_id: Uuid,
            user_id: Uuid,
            keywords: &[String],
            regions: &[String],
        ) -> Result<DiscoveryRun, PersistenceError> {
            let run = DiscoveryRun {
                id: Uuid::new_v4(),
                project_id,
                created_by: user_id,
                status: RunStatus::Pending,
                keywords: keywords.to_vec(),
                regions: regions.to_vec(),
                results_count: 0,
                error_message: None,
                created_at: Utc::now(),
                completed_at: None,
            };
            self.runs.lock().unwrap().insert(run.id, run.clone());
            Ok(run)
        }

        async fn update_run_status(
            &self,
            run_id: Uuid,
            status: RunStatus,
            results_count: Option<u32>,
            error_message: Option<String>,
        ) -> Result<DiscoveryRun, PersistenceError> {
            let mut runs = self.runs.lock().unwrap();
            let run = runs
                .get_mut(&run_id)
                .ok_or_else(|| PersistenceError::NotFound(run_id.to_string()))?;
            if !run.status.can_transition_to(status) && run.status != status {
                return Err(PersistenceError::Fatal(format!(
                    "illegal transition {:?} -> {:?}",
                    run.status, status
                )));
            }
            run.status = status;
            if let Some(count) = results_count {
                run.results_count = count;
            }
            run.error_message = error_message;
            if status.is_terminal() {
                run.completed_at = Some(Utc::now());
            }
            Ok(run.clone())
        }

        async fn get_run(&self, run_id: Uuid) -> Result<DiscoveryRun, PersistenceError> {
            self.runs
                .lock()
                .unwrap()
                .get(&run_id)
                .cloned()
                .ok_or_else(|| PersistenceError::NotFound(run_id.to_string()))
        }

        async fn list_runs_for_project(
            &self,
            project_id: Uuid,
            limit: u32,
        ) -> Result<Vec<DiscoveryRun>, PersistenceError> {
            let mut runs: Vec<_> = self
                .runs
                .lock()
                .unwrap()
                .values()
                .filter(|r| r.project_id == project_id)
                .cloned()
                .collect();
            runs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            runs.truncate(limit as usize);
            Ok(runs)
        }

        async fn insert_competitors(
            &self,
            organization_id: Uuid,
            run_id: Uuid,
            records: &[BasicCompetitor],
        ) -> Result<Vec<Uuid>, PersistenceError> {
            let mut store = self.competitors.lock().unwrap();
            let mut existing: std::collections::HashSet<String> = store
                .values()
                .filter(|c| c.organization_id == organization_id)
                .map(|c| Self::normalize(&c.basic.website))
                .collect();
            let mut inserted = Vec::new();
            for record in records {
                let domain = Self::normalize(&record.website);
                if existing.contains(&domain) {
                    continue;
                }
                let id = Uuid::new_v4();
                let now = Utc::now();
                store.insert(
                    id,
                    CompetitorRecord {
                        id,
                        organization_id,
                        search_run_id: Some(run_id),
                        basic: record.clone(),
                        enriched: None,
                        validation_status: None,
                        validated_by: None,
                        validated_at: None,
                        created_at: now,
                        updated_at: now,
                    },
                );
                existing.insert(domain);
                inserted.push(id);
            }
            Ok(inserted)
        }

        async fn find_competitor(&self, id: Uuid) -> Result<CompetitorRecord, PersistenceError> {
            self.competitors
                .lock()
                .unwrap()
                .get(&id)
                .cloned()
                .ok_or_else(|| PersistenceError::NotFound(id.to_string()))
        }

        async fn list_competitors(
            &self,
            organization_id: Uuid,
            filter: CompetitorFilter,
        ) -> Result<Vec<CompetitorRecord>, PersistenceError> {
            let runs = self.runs.lock().unwrap();
            let mut matches: Vec<_> = self
                .competitors
                .lock()
                .unwrap()
                .values()
                .filter(|c| c.organization_id == organization_id)
                .filter(|c| {
                    filter.country.as_deref().map_or(true, |want| c.basic.country.as_deref() == Some(want))
                })
                .filter(|c| {
                    filter.industry.as_deref().map_or(true, |want| c.basic.industry.as_deref() == Some(want))
                })
                .filter(|c| filter.validation_status.map_or(true, |want| c.validation_status == Some(want)))
                .filter(|c| filter.search_run_id.map_or(true, |want| c.search_run_id == Some(want)))
                .filter(|c| {
                    filter.region.as_deref().map_or(true, |want| {
                        c.search_run_id
                            .and_then(|run_id| runs.get(&run_id))
                            .map_or(false, |run| run.regions.iter().any(|r| r == want))
                    })
                })
                .cloned()
                .collect();
            matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(matches)
        }

        async fn existing_domains(
            &self,
            organization_id: Uuid,
        ) -> Result<Vec<String>, PersistenceError> {
            Ok(self
                .competitors
                .lock()
                .unwrap()
                .values()
                .filter(|c| c.organization_id == organization_id)
                .map(|c| Self::normalize(&c.basic.website))
                .collect())
        }

        async fn update_competitor_validation(
            &self,
            id: Uuid,
            status: ValidationStatus,
            validator_id: Uuid,
        ) -> Result<CompetitorRecord, PersistenceError> {
            let mut store = self.competitors.lock().unwrap();
            let record = store
                .get_mut(&id)
                .ok_or_else(|| PersistenceError::NotFound(id.to_string()))?;
            record.validation_status = Some(status);
            record.validated_by = Some(validator_id);
            record.validated_at = Some(Utc::now());
            record.updated_at = Utc::now();
            Ok(record.clone())
        }

        async fn update_competitor_enrichment(
            &self,
            id: Uuid,
            patch: EnrichmentPatch,
        ) -> Result<CompetitorRecord, PersistenceError> {
            let mut store = self.competitors.lock().unwrap();
            let record = store
                .get_mut(&id)
                .ok_or_else(|| PersistenceError::NotFound(id.to_string()))?;
            record.enriched = Some(patch.enriched);
            record.updated_at = Utc::now();
            Ok(record.clone())
        }

        async fn match_competitors_by_embedding(
            &self,
            _organization_id: Uuid,
            _vector: &[f32],
            _threshold: f64,
            _limit: u32,
        ) -> Result<Vec<SimilarCompetitor>, PersistenceError> {
            Ok(Vec::new())
        }
    }
}
