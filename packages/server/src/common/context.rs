//! Tenant context resolution.
//!
//! Identity, session, and membership verification are owned by the external
//! auth collaborator (out of scope for this crate). What the pipeline needs
//! from that collaborator is a resolved `RequestContext{user_id,
//! organization_id, tier}` — never a hard-coded id or a bare query-string
//! parameter threaded ad hoc through handlers. This extractor stands in for
//! that collaborator's output: it trusts headers set by the upstream auth
//! layer rather than performing authentication itself.

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use extraction::types::{RequestContext, SubscriptionTier};
use uuid::Uuid;

use crate::common::error::ApiError;

fn header_str<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts.headers.get(name)?.to_str().ok()
}

pub struct AuthContext(pub RequestContext);

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let organization_id = header_str(parts, "x-organization-id")
            .ok_or_else(|| ApiError::validation("missing x-organization-id header"))?
            .parse::<Uuid>()
            .map_err(|_| ApiError::validation("x-organization-id is not a valid UUID"))?;

        let user_id = header_str(parts, "x-user-id")
            .ok_or_else(|| ApiError::validation("missing x-user-id header"))?
            .parse::<Uuid>()
            .map_err(|_| ApiError::validation("x-user-id is not a valid UUID"))?;

        let tier = match header_str(parts, "x-subscription-tier") {
            Some("premium") => SubscriptionTier::Premium,
            Some("trial") => SubscriptionTier::Trial,
            _ => SubscriptionTier::Free,
        };

        Ok(AuthContext(RequestContext {
            user_id,
            organization_id,
            tier,
        }))
    }
}
