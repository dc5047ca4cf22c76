//! Durable job queue and bounded-concurrency worker pool driving the
//! discovery pipeline (§4.8).
//!
//! One async task per queue slot claims the next eligible `discover` job
//! with a `FOR UPDATE SKIP LOCKED` claim so concurrent worker processes
//! never double-process a job; a claimed-but-unfinished job whose lease
//! expires becomes eligible again for another worker. Each claimed job runs
//! under a wall-clock timeout racing the discovery handler — losing that
//! race marks the run `failed` with `error_message="timeout"` and drops the
//! job rather than retrying it.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use extraction::types::{DiscoveryContext, RunStatus};
use serde_json::Value;
use sqlx::{PgPool, Row};
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::kernel::AppState;

const LEASE: Duration = Duration::from_secs(60 * 15);
const BACKOFF_BASE_SECONDS: i64 = 5;

#[derive(sqlx::FromRow)]
struct ClaimedRow {
    id: Uuid,
    payload: Value,
    attempts: i32,
}

/// Durable store for `discover` jobs, backed by Postgres.
pub struct JobQueue {
    pool: PgPool,
}

impl JobQueue {
    /// The `discovery_jobs` table itself is owned by the `migrations/`
    /// directory, applied at startup via `sqlx::migrate!`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn enqueue(&self, context: &DiscoveryContext, max_attempts: u32) -> anyhow::Result<Uuid> {
        let payload = serde_json::to_value(context)?;
        let row = sqlx::query("INSERT INTO discovery_jobs (payload, max_attempts) VALUES ($1, $2) RETURNING id")
            .bind(payload)
            .bind(max_attempts as i32)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get("id")?)
    }

    /// Claim one eligible job, or `None` if the queue is empty. Expired
    /// leases (a worker that died mid-job) are eligible again.
    async fn claim(&self) -> anyhow::Result<Option<ClaimedRow>> {
        let lease_until: DateTime<Utc> = Utc::now() + LEASE;
        let row = sqlx::query_as::<_, ClaimedRow>(
            r#"
            WITH next AS (
                SELECT id FROM discovery_jobs
                WHERE status = 'pending'
                  AND next_run_at <= now()
                  AND (locked_until IS NULL OR locked_until < now())
                ORDER BY next_run_at
                FOR UPDATE SKIP LOCKED
                LIMIT 1
            )
            UPDATE discovery_jobs
            SET status = 'running', locked_until = $1
            FROM next
            WHERE discovery_jobs.id = next.id
            RETURNING discovery_jobs.id, discovery_jobs.payload, discovery_jobs.attempts
            "#,
        )
        .bind(lease_until)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn complete(&self, job_id: Uuid) -> anyhow::Result<()> {
        sqlx::query("UPDATE discovery_jobs SET status = 'succeeded', locked_until = NULL WHERE id = $1")
            .bind(job_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// A job is dropped, not retried, on timeout — a timed-out job is not a
    /// transient failure worth reattempting.
    async fn drop_job(&self, job_id: Uuid) -> anyhow::Result<()> {
        sqlx::query("UPDATE discovery_jobs SET status = 'timed_out', locked_until = NULL WHERE id = $1")
            .bind(job_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Reschedule with exponential backoff, or dead-letter once `attempts`
    /// exhausts `max_attempts`.
    async fn fail(&self, job_id: Uuid, attempts: i32, max_attempts: i32) -> anyhow::Result<bool> {
        let next_attempt = attempts + 1;
        if next_attempt >= max_attempts {
            sqlx::query(
                "UPDATE discovery_jobs SET status = 'dead_letter', attempts = $2, locked_until = NULL WHERE id = $1",
            )
            .bind(job_id)
            .bind(next_attempt)
            .execute(&self.pool)
            .await?;
            return Ok(false);
        }
        let backoff = Duration::from_secs(BACKOFF_BASE_SECONDS as u64 * 2u64.pow(attempts as u32));
        let next_run_at = Utc::now() + backoff;
        sqlx::query(
            "UPDATE discovery_jobs SET status = 'pending', attempts = $2, next_run_at = $3, locked_until = NULL \
             WHERE id = $1",
        )
        .bind(job_id)
        .bind(next_attempt)
        .bind(next_run_at)
        .execute(&self.pool)
        .await?;
        Ok(true)
    }
}

/// Runs `concurrency` claim loops until `shutdown` fires, then drains
/// in-flight jobs up to `drain_timeout` before returning.
pub async fn run_workers(
    state: AppState,
    queue: Arc<JobQueue>,
    concurrency: usize,
    max_attempts: u32,
    job_wallclock: Duration,
    shutdown: CancellationToken,
    drain_timeout: Duration,
) {
    let permits = Arc::new(Semaphore::new(concurrency));
    let mut handles = Vec::new();

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            permit = permits.clone().acquire_owned() => {
                let permit = permit.expect("semaphore not closed");
                match queue.claim().await {
                    Ok(Some(job)) => {
                        let state = state.clone();
                        let queue = queue.clone();
                        handles.push(tokio::spawn(async move {
                            let _permit = permit;
                            process_job(state, queue, job, max_attempts, job_wallclock).await;
                        }));
                    }
                    Ok(None) => {
                        drop(permit);
                        tokio::time::sleep(Duration::from_millis(500)).await;
                    }
                    Err(e) => {
                        drop(permit);
                        error!(error = %e, "failed to claim discovery job");
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        }
    }

    info!("worker runtime shutting down, draining in-flight jobs");
    let drain = futures::future::join_all(handles);
    let _ = timeout(drain_timeout, drain).await;
}

async fn process_job(state: AppState, queue: Arc<JobQueue>, job: ClaimedRow, max_attempts: u32, wallclock: Duration) {
    let context: DiscoveryContext = match serde_json::from_value(job.payload) {
        Ok(c) => c,
        Err(e) => {
            error!(job_id = %job.id, error = %e, "malformed discovery job payload, dead-lettering");
            let _ = queue.fail(job.id, max_attempts as i32, max_attempts as i32).await;
            return;
        }
    };
    let run_id = context.run_id;

    let outcome = timeout(
        wallclock,
        extraction::run_discovery(&context, state.search.as_ref(), state.ai.as_ref(), state.store.as_ref(), &state.discovery_config),
    )
    .await;

    match outcome {
        Ok(Ok(result)) => {
            info!(run_id = %run_id, results_count = result.results_count, "discovery job completed");
            let _ = queue.complete(job.id).await;
        }
        Ok(Err(e)) => {
            warn!(run_id = %run_id, error = %e, "discovery job failed");
            let _ = state
                .store
                .update_run_status(run_id, RunStatus::Failed, None, Some(e.to_string()))
                .await;
            if let Err(e) = queue.fail(job.id, job.attempts, max_attempts as i32).await {
                error!(job_id = %job.id, error = %e, "failed to reschedule discovery job");
            }
        }
        Err(_) => {
            warn!(run_id = %run_id, "discovery job exceeded wall-clock budget, marking failed");
            let _ = state
                .store
                .update_run_status(run_id, RunStatus::Failed, None, Some("timeout".to_string()))
                .await;
            let _ = queue.drop_job(job.id).await;
        }
    }
}
