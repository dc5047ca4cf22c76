//! Request/response shapes for the competitor HTTP surface (§6).

use chrono::{DateTime, Utc};
use extraction::traits::store::{CompetitorRecord, ValidationStatus};
use extraction::types::{BasicCompetitor, EnrichedCompetitor};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitorListQuery {
    pub organization_id: Uuid,
    pub region: Option<String>,
    pub country: Option<String>,
    pub industry: Option<String>,
    pub validation_status: Option<String>,
    pub search_run_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatusWire {
    Approved,
    Rejected,
}

impl From<ValidationStatusWire> for ValidationStatus {
    fn from(value: ValidationStatusWire) -> Self {
        match value {
            ValidationStatusWire::Approved => ValidationStatus::Approved,
            ValidationStatusWire::Rejected => ValidationStatus::Rejected,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ValidateCompetitorRequest {
    pub status: ValidationStatusWire,
}

fn status_wire(status: Option<ValidationStatus>) -> Option<&'static str> {
    status.map(|s| match s {
        ValidationStatus::Approved => "approved",
        ValidationStatus::Rejected => "rejected",
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitorResponse {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub search_run_id: Option<Uuid>,
    #[serde(flatten)]
    pub basic: BasicCompetitor,
    pub enriched: Option<EnrichedCompetitor>,
    pub validation_status: Option<&'static str>,
    pub validated_by: Option<Uuid>,
    pub validated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CompetitorRecord> for CompetitorResponse {
    fn from(record: CompetitorRecord) -> Self {
        Self {
            id: record.id,
            organization_id: record.organization_id,
            search_run_id: record.search_run_id,
            basic: record.basic,
            enriched: record.enriched,
            validation_status: status_wire(record.validation_status),
            validated_by: record.validated_by,
            validated_at: record.validated_at,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}
