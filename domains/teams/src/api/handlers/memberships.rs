//! Invitation and membership API handlers
//!
//! Invitations are single-use join tokens. Issuing one requires Owner or
//! Admin role; accepting one consumes the token and creates the membership
//! in a single transaction, so concurrent acceptance attempts on the same
//! token produce exactly one member.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tallybook_common::{CallerId, Error, RepositoryError, Result, ValidatedJson};
use uuid::Uuid;
use validator::Validate;

use crate::api::middleware::TeamsState;
use crate::{
    create_membership_tx, get_invitation_by_token_tx, mark_invitation_accepted_tx, Invitation,
    Member, MemberRole,
};

/// Request for inviting a new team member
#[derive(Debug, Deserialize, Validate)]
pub struct InviteMemberRequest {
    /// Email address of the user to invite
    #[validate(email)]
    pub email: String,

    /// Role the invitee will hold once the invitation is accepted
    pub role: MemberRole,

    /// Member issuing the invitation; must hold Owner or Admin role
    pub inviter_id: Uuid,
}

/// Response for invitation creation
#[derive(Debug, Serialize)]
pub struct InviteMemberResponse {
    pub invitation_token: String,
}

/// Request for accepting an invitation
#[derive(Debug, Deserialize, Validate)]
pub struct AcceptInvitationRequest {
    /// Single-use join token from the invitation
    #[validate(length(min = 1))]
    pub token: String,

    /// User joining the team
    pub user_id: Uuid,
}

/// Response for membership operations
#[derive(Debug, Serialize)]
pub struct MembershipResponse {
    pub team_id: Uuid,
    pub user_id: Uuid,
    pub role: MemberRole,
    pub joined_at: DateTime<Utc>,
}

impl From<Member> for MembershipResponse {
    fn from(member: Member) -> Self {
        Self {
            team_id: member.team_id,
            user_id: member.user_id,
            role: member.role,
            joined_at: member.joined_at,
        }
    }
}

/// Invitation summary for listings; the single-use token is not re-exposed
#[derive(Debug, Serialize)]
pub struct InvitationSummary {
    pub invitation_id: Uuid,
    pub email: String,
    pub role: MemberRole,
    pub inviter_id: Uuid,
    pub accepted: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Invitation> for InvitationSummary {
    fn from(invitation: Invitation) -> Self {
        Self {
            invitation_id: invitation.id,
            email: invitation.email,
            role: invitation.role,
            inviter_id: invitation.inviter_id,
            accepted: invitation.accepted,
            created_at: invitation.created_at,
        }
    }
}

/// Send an invitation to join a team
///
/// **POST /v1/teams/{team_id}/invitations**
///
/// Only owners and admins can invite. Returns the single-use token; token
/// delivery to the invitee is the caller's concern.
pub async fn invite_member(
    State(state): State<TeamsState>,
    Path(team_id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<InviteMemberRequest>,
) -> Result<Json<InviteMemberResponse>> {
    if !state.repos.teams.exists(team_id).await? {
        return Err(Error::NotFound("Team not found".to_string()));
    }

    // Permission check: only owners and admins can invite
    let can_invite = state
        .repos
        .memberships
        .is_authorized(team_id, request.inviter_id, &[MemberRole::Owner, MemberRole::Admin])
        .await?;

    if !can_invite {
        return Err(Error::Forbidden(
            "Must be owner or admin to invite members".to_string(),
        ));
    }

    let invitation = Invitation::new(team_id, request.email, request.role, request.inviter_id)?;
    let created = state.repos.invitations.create(&invitation).await?;

    tracing::info!(team_id = %team_id, invitation_id = %created.id, "invitation issued");

    Ok(Json(InviteMemberResponse {
        invitation_token: created.token,
    }))
}

/// Accept a team invitation
///
/// **POST /v1/invitations/accept**
///
/// Consumes the token and inserts the membership atomically. The token row
/// is locked and flipped with a compare-and-set on `accepted`, so exactly
/// one of any number of concurrent acceptance attempts succeeds; the rest
/// observe `Conflict`.
pub async fn accept_invitation(
    State(state): State<TeamsState>,
    ValidatedJson(request): ValidatedJson<AcceptInvitationRequest>,
) -> Result<Json<MembershipResponse>> {
    let mut tx = state
        .repos
        .begin()
        .await
        .map_err(|e| Error::Internal(format!("Failed to begin transaction: {}", e)))?;

    let invitation = get_invitation_by_token_tx(&mut tx, &request.token)
        .await
        .map_err(|e| Error::Internal(format!("Failed to load invitation: {}", e)))?
        .ok_or_else(|| Error::NotFound("Invitation not found".to_string()))?;

    if invitation.accepted {
        return Err(Error::Conflict("Invitation already accepted".to_string()));
    }

    // CAS guard: a concurrent acceptance that slipped past the row lock
    // still loses here
    mark_invitation_accepted_tx(&mut tx, invitation.id)
        .await
        .map_err(|e| match e {
            RepositoryError::AlreadyExists => {
                Error::Conflict("Invitation already accepted".to_string())
            }
            other => Error::from(other),
        })?;

    let member = Member::new(invitation.team_id, request.user_id, invitation.role);
    let created = create_membership_tx(&mut tx, &member)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Error::Conflict("User is already a member of this team".to_string())
            }
            _ => Error::Internal(format!("Failed to create membership: {}", e)),
        })?;

    // Explicit commit — drop without commit = rollback (RAII)
    tx.commit()
        .await
        .map_err(|e| Error::Internal(format!("Failed to commit transaction: {}", e)))?;

    tracing::info!(
        team_id = %created.team_id,
        user_id = %created.user_id,
        "invitation accepted"
    );

    Ok(Json(MembershipResponse::from(created)))
}

/// List a team's members
///
/// **GET /v1/teams/{team_id}/members**
///
/// Any current member may list; ordered by join time.
pub async fn list_members(
    caller: CallerId,
    State(state): State<TeamsState>,
    Path(team_id): Path<Uuid>,
) -> Result<Json<Vec<MembershipResponse>>> {
    if !state.repos.teams.exists(team_id).await? {
        return Err(Error::NotFound("Team not found".to_string()));
    }

    let is_member = state
        .repos
        .memberships
        .is_authorized(team_id, caller.0, &[])
        .await?;
    if !is_member {
        return Err(Error::Forbidden("Not a member of this team".to_string()));
    }

    let members = state.repos.memberships.find_by_team(team_id).await?;
    Ok(Json(
        members.into_iter().map(MembershipResponse::from).collect(),
    ))
}

/// List a team's invitations
///
/// **GET /v1/teams/{team_id}/invitations**
///
/// Restricted to owners and admins, like issuing one.
pub async fn list_invitations(
    caller: CallerId,
    State(state): State<TeamsState>,
    Path(team_id): Path<Uuid>,
) -> Result<Json<Vec<InvitationSummary>>> {
    if !state.repos.teams.exists(team_id).await? {
        return Err(Error::NotFound("Team not found".to_string()));
    }

    let can_view = state
        .repos
        .memberships
        .is_authorized(team_id, caller.0, &[MemberRole::Owner, MemberRole::Admin])
        .await?;
    if !can_view {
        return Err(Error::Forbidden(
            "Must be owner or admin to view invitations".to_string(),
        ));
    }

    let invitations = state.repos.invitations.find_by_team(team_id).await?;
    Ok(Json(
        invitations.into_iter().map(InvitationSummary::from).collect(),
    ))
}
