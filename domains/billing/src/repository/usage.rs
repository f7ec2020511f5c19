//! Usage ledger repository

use crate::domain::entities::UsageRecord;
use sqlx::PgPool;
use tallybook_common::{is_transient, Result};
use uuid::Uuid;

/// Transient-failure retry budget for the append path
const MAX_RETRIES: u32 = 3;

#[derive(Clone)]
pub struct UsageRecordRepository {
    pool: PgPool,
}

impl UsageRecordRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Append a usage record to the ledger.
    ///
    /// The insert is purely additive, so transient storage failures are
    /// retried. A retried append that actually landed the first time shows
    /// up as a key conflict on the fixed record id; that counts as an
    /// accepted append and the stored row is returned.
    pub async fn create(&self, record: &UsageRecord) -> Result<UsageRecord> {
        let mut attempts = 0;
        loop {
            match self.insert(record).await {
                Ok(created) => return Ok(created),
                Err(e) if is_transient(&e) && attempts < MAX_RETRIES => {
                    attempts += 1;
                    tracing::warn!(
                        record_id = %record.id,
                        attempt = attempts,
                        error = %e,
                        "transient failure appending usage record, retrying"
                    );
                }
                Err(e) => {
                    if attempts > 0 {
                        if let sqlx::Error::Database(db) = &e {
                            if db.is_unique_violation() {
                                if let Some(existing) = self.get_by_id(record.id).await? {
                                    return Ok(existing);
                                }
                            }
                        }
                    }
                    return Err(e.into());
                }
            }
        }
    }

    async fn insert(&self, record: &UsageRecord) -> std::result::Result<UsageRecord, sqlx::Error> {
        sqlx::query_as::<_, UsageRecord>(
            r#"
            INSERT INTO usage_records
                (id, team_id, user_id, usage_type, amount, unit, cost, recorded_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, team_id, user_id, usage_type, amount, unit, cost, recorded_at, seq
            "#,
        )
        .bind(record.id)
        .bind(record.team_id)
        .bind(record.user_id)
        .bind(&record.usage_type)
        .bind(record.amount)
        .bind(&record.unit)
        .bind(record.cost)
        .bind(record.recorded_at)
        .fetch_one(&self.pool)
        .await
    }

    /// Find a usage record by ID
    pub async fn get_by_id(&self, record_id: Uuid) -> Result<Option<UsageRecord>> {
        let row = sqlx::query_as::<_, UsageRecord>(
            r#"
            SELECT id, team_id, user_id, usage_type, amount, unit, cost, recorded_at, seq
            FROM usage_records
            WHERE id = $1
            "#,
        )
        .bind(record_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// All records for a team, in durable commit order
    pub async fn find_by_team(&self, team_id: Uuid) -> Result<Vec<UsageRecord>> {
        let rows = sqlx::query_as::<_, UsageRecord>(
            r#"
            SELECT id, team_id, user_id, usage_type, amount, unit, cost, recorded_at, seq
            FROM usage_records
            WHERE team_id = $1
            ORDER BY seq ASC
            "#,
        )
        .bind(team_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
