//! The one place pipeline/persistence error kinds are translated into HTTP
//! status codes. Nothing below this module knows HTTP exists.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use extraction::{PersistenceError, PipelineError};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unprocessable: {0}")]
    Unprocessable(String),

    #[error("project is not owned by the caller's organization")]
    AuthorizationScope,

    #[error("over quota")]
    OverQuota,

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::Validation(msg.into())
    }
}

impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self {
        match e {
            PipelineError::Validation { reason } => ApiError::Validation(reason),
            PipelineError::AuthorizationScope { .. } => ApiError::AuthorizationScope,
            PipelineError::Persistence(PersistenceError::NotFound(id)) => ApiError::NotFound(id),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<PersistenceError> for ApiError {
    fn from(e: PersistenceError) -> Self {
        match e {
            PersistenceError::NotFound(id) => ApiError::NotFound(id),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::AuthorizationScope => StatusCode::NOT_FOUND,
            ApiError::OverQuota => StatusCode::PAYMENT_REQUIRED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
