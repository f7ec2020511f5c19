//! Repository implementations for the Billing domain

pub mod invoices;
pub mod payments;
pub mod transactions;
pub mod usage;

use sqlx::{PgPool, Postgres, Transaction};
use tallybook_common::Result;
use uuid::Uuid;

pub use invoices::InvoiceRepository;
pub use payments::PaymentRepository;
pub use transactions::{
    create_invoice_tx, create_line_item_tx, create_payment_tx, get_invoice_by_id_tx,
    mark_invoice_paid_tx, usage_in_window_tx,
};
pub use usage::UsageRecordRepository;

/// Combined repository access for the Billing domain
#[derive(Clone)]
pub struct BillingRepositories {
    pool: PgPool,
    pub usage: UsageRecordRepository,
    pub invoices: InvoiceRepository,
    pub payments: PaymentRepository,
}

impl BillingRepositories {
    pub fn new(pool: PgPool) -> Self {
        Self {
            usage: UsageRecordRepository::new(pool.clone()),
            invoices: InvoiceRepository::new(pool.clone()),
            payments: PaymentRepository::new(pool.clone()),
            pool,
        }
    }

    /// Begin a new database transaction.
    pub async fn begin(&self) -> std::result::Result<Transaction<'static, Postgres>, sqlx::Error> {
        self.pool.begin().await
    }

    /// Check whether a team exists. Billing never mutates team records; this
    /// read is the only cross-domain touch point.
    pub async fn team_exists(&self, team_id: Uuid) -> Result<bool> {
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
