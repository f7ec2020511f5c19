//! Team repository

use crate::domain::entities::Team;
use sqlx::PgPool;
use tallybook_common::Result;
use uuid::Uuid;

#[derive(Clone)]
pub struct TeamRepository {
    pool: PgPool,
}

impl TeamRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find team by ID
    pub async fn get_by_id(&self, team_id: Uuid) -> Result<Option<Team>> {
        let row = sqlx::query_as::<_, Team>(
            r#"
            SELECT id, name, owner_id, api_key, created_at
            FROM teams
            WHERE id = $1
            "#,
        )
        .bind(team_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Check whether a team exists
    pub async fn exists(&self, team_id: Uuid) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(SELECT 1 FROM teams WHERE id = $1)
            "#,
        )
        .bind(team_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}
