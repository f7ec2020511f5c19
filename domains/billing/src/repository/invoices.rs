//! Invoice repository

use crate::domain::entities::{Invoice, InvoiceLineItem};
use sqlx::PgPool;
use tallybook_common::Result;
use uuid::Uuid;

#[derive(Clone)]
pub struct InvoiceRepository {
    pool: PgPool,
}

impl InvoiceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find invoice by ID
    pub async fn get_by_id(&self, invoice_id: Uuid) -> Result<Option<Invoice>> {
        let row = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT id, team_id, period_start, period_end, total, status, created_at
            FROM invoices
            WHERE id = $1
            "#,
        )
        .bind(invoice_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Check whether an invoice exists
    pub async fn exists(&self, invoice_id: Uuid) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(SELECT 1 FROM invoices WHERE id = $1)
            "#,
        )
        .bind(invoice_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    /// Line items for an invoice, ordered by user for stable output
    pub async fn find_line_items(&self, invoice_id: Uuid) -> Result<Vec<InvoiceLineItem>> {
        let rows = sqlx::query_as::<_, InvoiceLineItem>(
            r#"
            SELECT id, invoice_id, user_id, tokens_used, cost
            FROM invoice_line_items
            WHERE invoice_id = $1
            ORDER BY user_id ASC
            "#,
        )
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// All invoices for a team, newest first
    pub async fn find_by_team(&self, team_id: Uuid) -> Result<Vec<Invoice>> {
        let rows = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT id, team_id, period_start, period_end, total, status, created_at
            FROM invoices
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
