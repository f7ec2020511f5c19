//! Membership repository

use crate::domain::entities::{Member, MemberRole};
use sqlx::PgPool;
use tallybook_common::Result;
use uuid::Uuid;

#[derive(Clone)]
pub struct MembershipRepository {
    pool: PgPool,
}

impl MembershipRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a membership by team and user
    pub async fn get_by_team_and_user(
        &self,
        team_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Member>> {
        let row = sqlx::query_as::<_, Member>(
            r#"
            SELECT team_id, user_id, role, joined_at
            FROM memberships
            WHERE team_id = $1 AND user_id = $2
            "#,
        )
        .bind(team_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Find all members of a team
    pub async fn find_by_team(&self, team_id: Uuid) -> Result<Vec<Member>> {
        let rows = sqlx::query_as::<_, Member>(
            r#"
            SELECT team_id, user_id, role, joined_at
            FROM memberships
            WHERE team_id = $1
            ORDER BY joined_at ASC
            "#,
        )
        .bind(team_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Internal authorization guard: does `user_id` hold one of
    /// `required_roles` on `team_id`?
    ///
    /// Pure read used by other components; an empty `required_roles` slice
    /// means any current membership suffices.
    pub async fn is_authorized(
        &self,
        team_id: Uuid,
        user_id: Uuid,
        required_roles: &[MemberRole],
    ) -> Result<bool> {
        let membership = self.get_by_team_and_user(team_id, user_id).await?;

        Ok(match membership {
            Some(member) => required_roles.is_empty() || required_roles.contains(&member.role),
            None => false,
        })
    }
}
