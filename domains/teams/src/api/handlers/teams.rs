//! Team management API handlers
//!
//! Team creation and API key retrieval. A team must never exist without its
//! owner membership, so creation inserts both rows in one transaction.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tallybook_common::{CallerId, Error, Result, ValidatedJson};
use uuid::Uuid;
use validator::Validate;

use crate::api::middleware::TeamsState;
use crate::{create_membership_tx, create_team_tx, Member, MemberRole, Team};

/// Request for creating a new team
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTeamRequest {
    /// Team display name (1-100 chars)
    #[validate(length(min = 1, max = 100))]
    pub name: String,

    /// User who will own the team
    pub owner_user_id: Uuid,
}

/// Response for team creation
#[derive(Debug, Serialize)]
pub struct CreateTeamResponse {
    pub team_id: Uuid,
    pub api_key: String,
}

/// Response for API key retrieval
#[derive(Debug, Serialize)]
pub struct ApiKeyResponse {
    pub api_key: String,
}

/// Create a new team
///
/// **POST /v1/teams**
///
/// Creates the team row and its Owner membership atomically; a team is
/// never observable without its owner.
pub async fn create_team(
    State(state): State<TeamsState>,
    ValidatedJson(request): ValidatedJson<CreateTeamRequest>,
) -> Result<(StatusCode, Json<CreateTeamResponse>)> {
    let team = Team::new(request.name, request.owner_user_id)?;
    let owner = Member::new(team.id, request.owner_user_id, MemberRole::Owner);

    let mut tx = state
        .repos
        .begin()
        .await
        .map_err(|e| Error::Internal(format!("Failed to begin transaction: {}", e)))?;

    let created_team = create_team_tx(&mut tx, &team)
        .await
        .map_err(|e| Error::Internal(format!("Failed to create team: {}", e)))?;

    create_membership_tx(&mut tx, &owner)
        .await
        .map_err(|e| Error::Internal(format!("Failed to create owner membership: {}", e)))?;

    // Explicit commit — drop without commit = rollback (RAII)
    tx.commit()
        .await
        .map_err(|e| Error::Internal(format!("Failed to commit transaction: {}", e)))?;

    tracing::info!(team_id = %created_team.id, "team created");

    Ok((
        StatusCode::CREATED,
        Json(CreateTeamResponse {
            team_id: created_team.id,
            api_key: created_team.api_key,
        }),
    ))
}

/// Retrieve a team's API key
///
/// **GET /v1/teams/{team_id}/api-key**
///
/// Caller identity comes from the `X-User-Id` header. Fails with `NotFound`
/// if the team does not exist and `Forbidden` if the caller is not a member.
pub async fn get_api_key(
    caller: CallerId,
    State(state): State<TeamsState>,
    Path(team_id): Path<Uuid>,
) -> Result<Json<ApiKeyResponse>> {
    let team = state
        .repos
        .teams
        .get_by_id(team_id)
        .await?
        .ok_or_else(|| Error::NotFound("Team not found".to_string()))?;

    // Any current member may read the key; role does not matter
    let is_member = state
        .repos
        .memberships
        .is_authorized(team_id, caller.0, &[])
        .await?;

    if !is_member {
        return Err(Error::Forbidden("Not a member of this team".to_string()));
    }

    Ok(Json(ApiKeyResponse {
        api_key: team.api_key,
    }))
}
