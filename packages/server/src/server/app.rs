//! Application assembly: merges the discovery and competitor routers under
//! the shared [`AppState`], with the cross-cutting `tower_http` layers every
//! route gets regardless of domain.

use std::time::Duration;

use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::domains::{competitors, discovery};
use crate::kernel::AppState;
use crate::server::routes::health;

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(discovery::router())
        .merge(competitors::router())
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
