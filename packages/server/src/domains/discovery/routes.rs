use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use uuid::Uuid;

use crate::common::error::ApiError;
use crate::common::AuthContext;
use crate::domains::discovery::models::{CreateRunRequest, ListRunsQuery, RunResponse};
use crate::domains::discovery::service::{self, CreateRunInput};
use crate::kernel::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/discovery/runs", post(create_run).get(list_runs))
        .route("/discovery/runs/:id", get(get_run))
}

async fn create_run(
    State(state): State<AppState>,
    AuthContext(ctx): AuthContext,
    Json(body): Json<CreateRunRequest>,
) -> Result<Json<RunResponse>, ApiError> {
    let project_id = body
        .project_id
        .parse::<Uuid>()
        .map_err(|_| ApiError::validation("projectId is not a valid UUID"))?;

    let run = service::create_run(
        CreateRunInput {
            project_id,
            organization_id: ctx.organization_id,
            user_id: ctx.user_id,
            tier: ctx.tier,
            keywords: body.keywords,
            regions: body.regions,
            industries: body.industries,
            max_results: body.max_results,
        },
        state.store.as_ref(),
        state.projects.as_ref(),
        &state.jobs,
        state.job_max_attempts,
    )
    .await?;
    Ok(Json(run.into()))
}

async fn get_run(
    State(state): State<AppState>,
    AuthContext(ctx): AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<RunResponse>, ApiError> {
    let run = service::get_run(id, ctx.organization_id, state.store.as_ref(), state.projects.as_ref()).await?;
    Ok(Json(run.into()))
}

async fn list_runs(
    State(state): State<AppState>,
    AuthContext(ctx): AuthContext,
    Query(query): Query<ListRunsQuery>,
) -> Result<Json<Vec<RunResponse>>, ApiError> {
    let runs = service::list_runs(query.project_id, ctx.organization_id, state.store.as_ref(), state.projects.as_ref()).await?;
    Ok(Json(runs.into_iter().map(Into::into).collect()))
}
