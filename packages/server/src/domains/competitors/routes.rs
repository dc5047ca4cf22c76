use axum::extract::{Path, Query, State};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use extraction::traits::store::CompetitorFilter;
use uuid::Uuid;

use crate::common::error::ApiError;
use crate::common::AuthContext;
use crate::domains::competitors::models::{CompetitorListQuery, CompetitorResponse, ValidateCompetitorRequest};
use crate::domains::competitors::service;
use crate::kernel::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/competitors", get(list_competitors))
        .route("/competitors/:id", get(get_competitor))
        .route("/competitors/:id/validate", patch(validate_competitor))
        .route("/competitors/:id/enrich", post(enrich_competitor))
}

async fn list_competitors(
    State(state): State<AppState>,
    Query(query): Query<CompetitorListQuery>,
) -> Result<Json<Vec<CompetitorResponse>>, ApiError> {
    let filter = CompetitorFilter {
        region: query.region,
        country: query.country,
        industry: query.industry,
        validation_status: query.validation_status.and_then(|s| match s.as_str() {
            "approved" => Some(extraction::traits::store::ValidationStatus::Approved),
            "rejected" => Some(extraction::traits::store::ValidationStatus::Rejected),
            _ => None,
        }),
        search_run_id: query.search_run_id,
    };
    let records = service::list_competitors(query.organization_id, filter, state.store.as_ref()).await?;
    Ok(Json(records.into_iter().map(Into::into).collect()))
}

async fn get_competitor(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CompetitorResponse>, ApiError> {
    let record = service::get_competitor(id, state.store.as_ref()).await?;
    Ok(Json(record.into()))
}

async fn validate_competitor(
    State(state): State<AppState>,
    AuthContext(ctx): AuthContext,
    Path(id): Path<Uuid>,
    Json(body): Json<ValidateCompetitorRequest>,
) -> Result<Json<CompetitorResponse>, ApiError> {
    let record = service::validate_competitor(id, body.status.into(), ctx.user_id, state.store.as_ref()).await?;
    Ok(Json(record.into()))
}

async fn enrich_competitor(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CompetitorResponse>, ApiError> {
    let record = service::enrich_competitor(id, state.store.as_ref(), state.search.as_ref(), state.ai.as_ref()).await?;
    Ok(Json(record.into()))
}
