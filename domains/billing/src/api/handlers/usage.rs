//! Usage ledger API handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tallybook_common::{Error, Result, ValidatedJson};
use uuid::Uuid;
use validator::Validate;

use crate::api::middleware::BillingState;
use crate::UsageRecord;

/// Request for logging a billable usage event
#[derive(Debug, Deserialize, Validate)]
pub struct LogUsageRequest {
    pub team_id: Uuid,
    pub user_id: Uuid,

    /// Kind of usage, e.g. "inference"
    #[validate(length(min = 1))]
    pub usage_type: String,

    /// Quantity consumed; must be non-negative
    #[validate(range(min = 0.0))]
    pub amount: f64,

    /// Unit the amount is measured in, e.g. "tokens"
    #[validate(length(min = 1))]
    pub unit: String,

    /// Cost of this event; must be non-negative
    pub cost: Decimal,
}

/// Response for a logged usage event
#[derive(Debug, Serialize)]
pub struct UsageRecordResponse {
    pub record_id: Uuid,
    pub team_id: Uuid,
    pub user_id: Uuid,
    pub usage_type: String,
    pub amount: f64,
    pub unit: String,
    pub cost: Decimal,
    pub recorded_at: DateTime<Utc>,
}

impl From<UsageRecord> for UsageRecordResponse {
    fn from(record: UsageRecord) -> Self {
        Self {
            record_id: record.id,
            team_id: record.team_id,
            user_id: record.user_id,
            usage_type: record.usage_type,
            amount: record.amount,
            unit: record.unit,
            cost: record.cost,
            recorded_at: record.recorded_at,
        }
    }
}

/// Log a usage event
///
/// **POST /v1/usage**
///
/// Pure append: the record is stored verbatim, no deduplication. Callers
/// own idempotency of their own reporting.
pub async fn log_usage(
    State(state): State<BillingState>,
    ValidatedJson(request): ValidatedJson<LogUsageRequest>,
) -> Result<(StatusCode, Json<UsageRecordResponse>)> {
    if !state.repos.team_exists(request.team_id).await? {
        return Err(Error::NotFound("Team not found".to_string()));
    }

    let record = UsageRecord::new(
        request.team_id,
        request.user_id,
        request.usage_type,
        request.amount,
        request.unit,
        request.cost,
    )?;
    let created = state.repos.usage.create(&record).await?;

    tracing::debug!(
        team_id = %created.team_id,
        record_id = %created.id,
        usage_type = %created.usage_type,
        "usage recorded"
    );

    Ok((StatusCode::CREATED, Json(UsageRecordResponse::from(created))))
}

/// List a team's usage ledger
///
/// **GET /v1/teams/{team_id}/usage**
///
/// Records come back in durable commit order: two records from the same
/// team are returned in the order their writes committed.
pub async fn list_team_usage(
    State(state): State<BillingState>,
    Path(team_id): Path<Uuid>,
) -> Result<Json<Vec<UsageRecordResponse>>> {
    if !state.repos.team_exists(team_id).await? {
        return Err(Error::NotFound("Team not found".to_string()));
    }

    let records = state.repos.usage.find_by_team(team_id).await?;
    Ok(Json(
        records.into_iter().map(UsageRecordResponse::from).collect(),
    ))
}
