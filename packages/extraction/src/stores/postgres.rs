use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pgvector::Vector;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::PersistenceError;
use crate::traits::store::{
    CompetitorFilter, CompetitorRecord, CompetitorStore, EnrichmentPatch, SimilarCompetitor, ValidationStatus,
};
use crate::types::{
    BasicCompetitor, DataSource, DiscoveryRun, EnrichedCompetitor, RunStatus, SocialLinks, SocialMetrics,
    SwotAnalysis,
};

fn map_sqlx_err(e: sqlx::Error) -> PersistenceError {
    match &e {
        sqlx::Error::RowNotFound => PersistenceError::NotFound(e.to_string()),
        sqlx::Error::Database(db) if db.is_unique_violation() => PersistenceError::Conflict(e.to_string()),
        sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => PersistenceError::Transient(e.to_string()),
        _ => PersistenceError::Fatal(e.to_string()),
    }
}

fn status_to_db(status: RunStatus) -> &'static str {
    match status {
        RunStatus::Pending => "pending",
        RunStatus::Searching => "searching",
        RunStatus::Extracting => "extracting",
        RunStatus::Completed => "completed",
        RunStatus::Failed => "failed",
    }
}

fn status_from_db(s: &str) -> RunStatus {
    match s {
        "searching" => RunStatus::Searching,
        "extracting" => RunStatus::Extracting,
        "completed" => RunStatus::Completed,
        "failed" => RunStatus::Failed,
        _ => RunStatus::Pending,
    }
}

fn validation_to_db(status: ValidationStatus) -> &'static str {
    match status {
        ValidationStatus::Approved => "approved",
        ValidationStatus::Rejected => "rejected",
    }
}

fn validation_from_db(s: Option<&str>) -> Option<ValidationStatus> {
    match s {
        Some("approved") => Some(ValidationStatus::Approved),
        Some("rejected") => Some(ValidationStatus::Rejected),
        _ => None,
    }
}

fn data_source_to_db(source: DataSource) -> &'static str {
    match source {
        DataSource::Website => "website",
        DataSource::WebsiteCrawl => "website_crawl",
        DataSource::Linkedin => "linkedin",
        DataSource::Twitter => "twitter",
        DataSource::Facebook => "facebook",
        DataSource::AiAnalysis => "ai_analysis",
    }
}

fn data_source_from_db(s: &str) -> Option<DataSource> {
    match s {
        "website" => Some(DataSource::Website),
        "website_crawl" => Some(DataSource::WebsiteCrawl),
        "linkedin" => Some(DataSource::Linkedin),
        "twitter" => Some(DataSource::Twitter),
        "facebook" => Some(DataSource::Facebook),
        "ai_analysis" => Some(DataSource::AiAnalysis),
        _ => None,
    }
}

/// Implements the organization-level competitor store against Postgres, with
/// `pgvector` backing the semantic-dedup similarity search. The
/// `(organization_id, normalized domain(website))` uniqueness is enforced by
/// a unique index, so `insert_competitors` relies on `ON CONFLICT DO NOTHING`
/// rather than a pre-check.
#[derive(Clone)]
pub struct PostgresCompetitorStore {
    pool: PgPool,
}

impl PostgresCompetitorStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_record(row: &sqlx::postgres::PgRow) -> Result<CompetitorRecord, PersistenceError> {
        let basic = BasicCompetitor {
            name: row.try_get("name").map_err(map_sqlx_err)?,
            website: row.try_get("website").map_err(map_sqlx_err)?,
            description: row.try_get("description").map_err(map_sqlx_err)?,
            industry: row.try_get("industry").map_err(map_sqlx_err)?,
            country: row.try_get("country").map_err(map_sqlx_err)?,
            business_model: row.try_get("business_model").map_err(map_sqlx_err)?,
            value_proposition: row.try_get("value_proposition").map_err(map_sqlx_err)?,
            founded_year: row.try_get("founded_year").map_err(map_sqlx_err)?,
            total_funding: row.try_get("total_funding").map_err(map_sqlx_err)?,
        };

        let confidence_score: Option<i16> = row.try_get("confidence_score").map_err(map_sqlx_err)?;
        let enriched = confidence_score.map(|confidence_score| {
            let data_sources_raw: Vec<String> = row.try_get("data_sources").unwrap_or_default();
            EnrichedCompetitor {
                name: basic.name.clone(),
                website: basic.website.clone(),
                description: basic.description.clone(),
                industry: basic.industry.clone(),
                country: basic.country.clone(),
                tagline: row.try_get("tagline").ok(),
                headquarters: row.try_get("headquarters").ok(),
                founders: row.try_get("founders").unwrap_or_default(),
                funding_stage: row.try_get("funding_stage").ok().flatten(),
                total_funding: basic.total_funding,
                investors: row.try_get("investors").unwrap_or_default(),
                technologies: row.try_get("technologies").unwrap_or_default(),
                social_links: row
                    .try_get::<Option<serde_json::Value>, _>("social_links")
                    .ok()
                    .flatten()
                    .and_then(|v| serde_json::from_value::<SocialLinks>(v).ok())
                    .unwrap_or_default(),
                social_metrics: row
                    .try_get::<Option<serde_json::Value>, _>("social_metrics")
                    .ok()
                    .flatten()
                    .and_then(|v| serde_json::from_value::<SocialMetrics>(v).ok())
                    .unwrap_or_default(),
                swot: row
                    .try_get::<Option<serde_json::Value>, _>("swot")
                    .ok()
                    .flatten()
                    .and_then(|v| serde_json::from_value::<SwotAnalysis>(v).ok())
                    .unwrap_or_default(),
                confidence_score: confidence_score as u8,
                data_completeness: row.try_get::<Option<i16>, _>("data_completeness").ok().flatten().unwrap_or(0)
                    as u8,
                data_sources: data_sources_raw.iter().filter_map(|s| data_source_from_db(s)).collect(),
                enrichment_date: row
                    .try_get::<Option<DateTime<Utc>>, _>("enrichment_date")
                    .ok()
                    .flatten()
                    .unwrap_or_else(Utc::now),
            }
        });

        Ok(CompetitorRecord {
            id: row.try_get("id").map_err(map_sqlx_err)?,
            organization_id: row.try_get("organization_id").map_err(map_sqlx_err)?,
            search_run_id: row.try_get("search_run_id").map_err(map_sqlx_err)?,
            basic,
            enriched,
            validation_status: validation_from_db(row.try_get::<Option<String>, _>("validation_status").ok().flatten().as_deref()),
            validated_by: row.try_get("validated_by").map_err(map_sqlx_err)?,
            validated_at: row.try_get("validated_at").map_err(map_sqlx_err)?,
            created_at: row.try_get("created_at").map_err(map_sqlx_err)?,
            updated_at: row.try_get("updated_at").map_err(map_sqlx_err)?,
        })
    }
}

#[async_trait]
impl CompetitorStore for PostgresCompetitorStore {
    async fn create_run(
        &self,
        project_id: Uuid,
        user_id: Uuid,
        keywords: &[String],
        regions: &[String],
    ) -> Result<DiscoveryRun, PersistenceError> {
        let row = sqlx::query(
            r#"
            INSERT INTO search_runs (project_id, status, regions, keywords, results_count, created_by)
            VALUES ($1, 'pending', $2, $3, 0, $4)
            RETURNING id, project_id, status, regions, keywords, results_count, error_message,
                      created_at, completed_at, created_by
            "#,
        )
        .bind(project_id)
        .bind(regions)
        .bind(keywords)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(DiscoveryRun {
            id: row.try_get("id").map_err(map_sqlx_err)?,
            project_id: row.try_get("project_id").map_err(map_sqlx_err)?,
            created_by: row.try_get("created_by").map_err(map_sqlx_err)?,
            status: status_from_db(row.try_get::<String, _>("status").map_err(map_sqlx_err)?.as_str()),
            keywords: row.try_get("keywords").map_err(map_sqlx_err)?,
            regions: row.try_get("regions").map_err(map_sqlx_err)?,
            results_count: row.try_get::<i32, _>("results_count").map_err(map_sqlx_err)? as u32,
            error_message: row.try_get("error_message").map_err(map_sqlx_err)?,
            created_at: row.try_get("created_at").map_err(map_sqlx_err)?,
            completed_at: row.try_get("completed_at").map_err(map_sqlx_err)?,
        })
    }

    async fn update_run_status(
        &self,
        run_id: Uuid,
        status: RunStatus,
        results_count: Option<u32>,
        error_message: Option<String>,
    ) -> Result<DiscoveryRun, PersistenceError> {
        let current = self.get_run(run_id).await?;
        if !current.status.can_transition_to(status) && current.status != status {
            return Err(PersistenceError::Fatal(format!(
                "illegal transition {:?} -> {:?}",
                current.status, status
            )));
        }

        let row = sqlx::query(
            r#"
            UPDATE search_runs SET
                status = $2,
                results_count = COALESCE($3, results_count),
                error_message = $4,
                completed_at = CASE WHEN $2 IN ('completed', 'failed') THEN NOW() ELSE completed_at END
            WHERE id = $1
            RETURNING id, project_id, status, regions, keywords, results_count, error_message,
                      created_at, completed_at, created_by
            "#,
        )
        .bind(run_id)
        .bind(status_to_db(status))
        .bind(results_count.map(|c| c as i32))
        .bind(error_message)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(DiscoveryRun {
            id: row.try_get("id").map_err(map_sqlx_err)?,
            project_id: row.try_get("project_id").map_err(map_sqlx_err)?,
            created_by: row.try_get("created_by").map_err(map_sqlx_err)?,
            status: status_from_db(row.try_get::<String, _>("status").map_err(map_sqlx_err)?.as_str()),
            keywords: row.try_get("keywords").map_err(map_sqlx_err)?,
            regions: row.try_get("regions").map_err(map_sqlx_err)?,
            results_count: row.try_get::<i32, _>("results_count").map_err(map_sqlx_err)? as u32,
            error_message: row.try_get("error_message").map_err(map_sqlx_err)?,
            created_at: row.try_get("created_at").map_err(map_sqlx_err)?,
            completed_at: row.try_get("completed_at").map_err(map_sqlx_err)?,
        })
    }

    async fn get_run(&self, run_id: Uuid) -> Result<DiscoveryRun, PersistenceError> {
        let row = sqlx::query(
            r#"
            SELECT id, project_id, status, regions, keywords, results_count, error_message,
                   created_at, completed_at, created_by
            FROM search_runs WHERE id = $1
            "#,
        )
        .bind(run_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(DiscoveryRun {
            id: row.try_get("id").map_err(map_sqlx_err)?,
            project_id: row.try_get("project_id").map_err(map_sqlx_err)?,
            created_by: row.try_get("created_by").map_err(map_sqlx_err)?,
            status: status_from_db(row.try_get::<String, _>("status").map_err(map_sqlx_err)?.as_str()),
            keywords: row.try_get("keywords").map_err(map_sqlx_err)?,
            regions: row.try_get("regions").map_err(map_sqlx_err)?,
            results_count: row.try_get::<i32, _>("results_count").map_err(map_sqlx_err)? as u32,
            error_message: row.try_get("error_message").map_err(map_sqlx_err)?,
            created_at: row.try_get("created_at").map_err(map_sqlx_err)?,
            completed_at: row.try_get("completed_at").map_err(map_sqlx_err)?,
        })
    }

    async fn list_runs_for_project(&self, project_id: Uuid, limit: u32) -> Result<Vec<DiscoveryRun>, PersistenceError> {
        let rows = sqlx::query(
            r#"
            SELECT id, project_id, status, regions, keywords, results_count, error_message,
                   created_at, completed_at, created_by
            FROM search_runs WHERE project_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(project_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        rows.iter()
            .map(|row| {
                Ok(DiscoveryRun {
                    id: row.try_get("id").map_err(map_sqlx_err)?,
                    project_id: row.try_get("project_id").map_err(map_sqlx_err)?,
                    created_by: row.try_get("created_by").map_err(map_sqlx_err)?,
                    status: status_from_db(row.try_get::<String, _>("status").map_err(map_sqlx_err)?.as_str()),
                    keywords: row.try_get("keywords").map_err(map_sqlx_err)?,
                    regions: row.try_get("regions").map_err(map_sqlx_err)?,
                    results_count: row.try_get::<i32, _>("results_count").map_err(map_sqlx_err)? as u32,
                    error_message: row.try_get("error_message").map_err(map_sqlx_err)?,
                    created_at: row.try_get("created_at").map_err(map_sqlx_err)?,
                    completed_at: row.try_get("completed_at").map_err(map_sqlx_err)?,
                })
            })
            .collect()
    }

    async fn insert_competitors(
        &self,
        organization_id: Uuid,
        run_id: Uuid,
        records: &[BasicCompetitor],
    ) -> Result<Vec<Uuid>, PersistenceError> {
        let mut inserted = Vec::with_capacity(records.len());
        for record in records {
            let row = sqlx::query(
                r#"
                INSERT INTO competitors (
                    organization_id, search_run_id, name, website, description,
                    industry, country, business_model, value_proposition,
                    founded_year, total_funding
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                ON CONFLICT (organization_id, (regexp_replace(lower(website), '^https?://(www\.)?', ''))) DO NOTHING
                RETURNING id
                "#,
            )
            .bind(organization_id)
            .bind(run_id)
            .bind(&record.name)
            .bind(&record.website)
            .bind(&record.description)
            .bind(&record.industry)
            .bind(&record.country)
            .bind(&record.business_model)
            .bind(&record.value_proposition)
            .bind(record.founded_year)
            .bind(record.total_funding)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

            if let Some(row) = row {
                inserted.push(row.try_get("id").map_err(map_sqlx_err)?);
            }
        }
        Ok(inserted)
    }

    async fn find_competitor(&self, id: Uuid) -> Result<CompetitorRecord, PersistenceError> {
        let row = sqlx::query("SELECT * FROM competitors WHERE id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        Self::row_to_record(&row)
    }

    async fn list_competitors(
        &self,
        organization_id: Uuid,
        filter: CompetitorFilter,
    ) -> Result<Vec<CompetitorRecord>, PersistenceError> {
        let rows = sqlx::query(
            r#"
            SELECT c.* FROM competitors c
            LEFT JOIN search_runs r ON r.id = c.search_run_id
            WHERE c.organization_id = $1
              AND ($2::text IS NULL OR r.regions @> ARRAY[$2::text])
              AND ($3::text IS NULL OR c.country = $3)
              AND ($4::text IS NULL OR c.industry = $4)
              AND ($5::text IS NULL OR c.validation_status = $5)
              AND ($6::uuid IS NULL OR c.search_run_id = $6)
            ORDER BY c.created_at DESC
            "#,
        )
        .bind(organization_id)
        .bind(filter.region)
        .bind(filter.country)
        .bind(filter.industry)
        .bind(filter.validation_status.map(validation_to_db))
        .bind(filter.search_run_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        rows.iter().map(Self::row_to_record).collect()
    }

    async fn existing_domains(&self, organization_id: Uuid) -> Result<Vec<String>, PersistenceError> {
        let rows = sqlx::query("SELECT website FROM competitors WHERE organization_id = $1")
            .bind(organization_id)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        rows.iter()
            .map(|row| row.try_get::<String, _>("website").map(|w| crate::dedup::normalize_domain(&w)).map_err(map_sqlx_err))
            .collect()
    }

    async fn update_competitor_validation(
        &self,
        id: Uuid,
        status: ValidationStatus,
        validator_id: Uuid,
    ) -> Result<CompetitorRecord, PersistenceError> {
        let row = sqlx::query(
            r#"
            UPDATE competitors SET
                validation_status = $2,
                validated_by = $3,
                validated_at = NOW(),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(validation_to_db(status))
        .bind(validator_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Self::row_to_record(&row)
    }

    async fn update_competitor_enrichment(
        &self,
        id: Uuid,
        patch: EnrichmentPatch,
    ) -> Result<CompetitorRecord, PersistenceError> {
        let enriched = patch.enriched;
        let data_sources: Vec<&str> = enriched.data_sources.iter().map(|s| data_source_to_db(*s)).collect();
        let row = sqlx::query(
            r#"
            UPDATE competitors SET
                description = $2,
                industry = $3,
                country = $4,
                tagline = $5,
                headquarters = $6,
                founders = $7,
                funding_stage = $8,
                total_funding = $9,
                investors = $10,
                technologies = $11,
                social_links = $12,
                social_metrics = $13,
                swot = $14,
                confidence_score = $15,
                data_completeness = $16,
                data_sources = $17,
                enrichment_date = $18,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&enriched.description)
        .bind(&enriched.industry)
        .bind(&enriched.country)
        .bind(&enriched.tagline)
        .bind(&enriched.headquarters)
        .bind(&enriched.founders)
        .bind(&enriched.funding_stage)
        .bind(enriched.total_funding)
        .bind(&enriched.investors)
        .bind(&enriched.technologies)
        .bind(serde_json::to_value(&enriched.social_links).unwrap_or_default())
        .bind(serde_json::to_value(&enriched.social_metrics).unwrap_or_default())
        .bind(serde_json::to_value(&enriched.swot).unwrap_or_default())
        .bind(enriched.confidence_score as i16)
        .bind(enriched.data_completeness as i16)
        .bind(&data_sources)
        .bind(enriched.enrichment_date)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Self::row_to_record(&row)
    }

    async fn match_competitors_by_embedding(
        &self,
        organization_id: Uuid,
        vector: &[f32],
        threshold: f64,
        limit: u32,
    ) -> Result<Vec<SimilarCompetitor>, PersistenceError> {
        let rows = sqlx::query("SELECT id, similarity FROM match_competitors($1, $2, $3, $4)")
            .bind(Vector::from(vector.to_vec()))
            .bind(threshold)
            .bind(limit as i32)
            .bind(organization_id)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        rows.iter()
            .map(|row| {
                Ok(SimilarCompetitor {
                    id: row.try_get("id").map_err(map_sqlx_err)?,
                    similarity: row.try_get("similarity").map_err(map_sqlx_err)?,
                })
            })
            .collect()
    }
}
