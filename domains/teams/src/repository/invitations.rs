//! Invitation repository

use crate::domain::entities::Invitation;
use sqlx::PgPool;
use tallybook_common::Result;
use uuid::Uuid;

#[derive(Clone)]
pub struct InvitationRepository {
    pool: PgPool,
}

impl InvitationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new invitation
    pub async fn create(&self, invitation: &Invitation) -> Result<Invitation> {
        let created = sqlx::query_as::<_, Invitation>(
            r#"
            INSERT INTO invitations (id, team_id, email, role, inviter_id, token, created_at, accepted)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, team_id, email, role, inviter_id, token, created_at, accepted
            "#,
        )
        .bind(invitation.id)
        .bind(invitation.team_id)
        .bind(&invitation.email)
        .bind(invitation.role)
        .bind(invitation.inviter_id)
        .bind(&invitation.token)
        .bind(invitation.created_at)
        .bind(invitation.accepted)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    /// Find all invitations for a team
    pub async fn find_by_team(&self, team_id: Uuid) -> Result<Vec<Invitation>> {
        let rows = sqlx::query_as::<_, Invitation>(
            r#"
            SELECT id, team_id, email, role, inviter_id, token, created_at, accepted
            FROM invitations
            WHERE team_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(team_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
