use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::kernel::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    database: DatabaseHealth,
}

#[derive(Serialize)]
pub struct DatabaseHealth {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Checks database connectivity. Returns `200` when the pool can answer a
/// trivial query within 5 seconds, `503` otherwise.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let db = match tokio::time::timeout(
        std::time::Duration::from_secs(5),
        sqlx::query("SELECT 1").execute(&state.pool),
    )
    .await
    {
        Ok(Ok(_)) => DatabaseHealth { status: "ok", error: None },
        Ok(Err(e)) => DatabaseHealth {
            status: "error",
            error: Some(e.to_string()),
        },
        Err(_) => DatabaseHealth {
            status: "error",
            error: Some("query timed out after 5s".to_string()),
        },
    };

    let healthy = db.status == "ok";
    let status_code = if healthy { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (
        status_code,
        Json(HealthResponse {
            status: if healthy { "healthy" } else { "unhealthy" },
            database: db,
        }),
    )
}
