//! Payment repository

use crate::domain::entities::Payment;
use sqlx::PgPool;
use tallybook_common::Result;
use uuid::Uuid;

#[derive(Clone)]
pub struct PaymentRepository {
    pool: PgPool,
}

impl PaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All payment attempts recorded against an invoice, oldest first
    pub async fn find_by_invoice(&self, invoice_id: Uuid) -> Result<Vec<Payment>> {
        let rows = sqlx::query_as::<_, Payment>(
            r#"
            SELECT id, invoice_id, method, amount, status, created_at
            FROM payments
            WHERE invoice_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
