//! Transactional free functions for the Billing domain (Zero2Prod pattern)
//!
//! Invoice generation (snapshot read + invoice + line items) and payment
//! (status flip + payment row) each run through these inside a single
//! `sqlx::Transaction`. Dropping the transaction without commit rolls
//! everything back, so a partial invoice is never observable.

use crate::domain::aggregate::BillingPeriod;
use crate::domain::entities::{Invoice, InvoiceLineItem, InvoiceState, Payment, UsageRecord};
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

/// Read the ledger rows inside a window, within an existing transaction.
///
/// The transaction's read point fixes the snapshot: rows committed before it
/// are included, rows committed after are excluded, consistently for the
/// whole invoice.
pub async fn usage_in_window_tx(
    transaction: &mut Transaction<'_, Postgres>,
    team_id: Uuid,
    period: &BillingPeriod,
) -> std::result::Result<Vec<UsageRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, UsageRecord>(
        r#"
        SELECT id, team_id, user_id, usage_type, amount, unit, cost, recorded_at, seq
        FROM usage_records
        WHERE team_id = $1 AND recorded_at >= $2 AND recorded_at < $3
        ORDER BY seq ASC
        "#,
    )
    .bind(team_id)
    .bind(period.start)
    .bind(period.end)
    .fetch_all(&mut **transaction)
    .await?;
    Ok(rows)
}

/// Insert an invoice row within an existing transaction.
pub async fn create_invoice_tx(
    transaction: &mut Transaction<'_, Postgres>,
    invoice: &Invoice,
) -> std::result::Result<Invoice, sqlx::Error> {
    let created = sqlx::query_as::<_, Invoice>(
        r#"
        INSERT INTO invoices (id, team_id, period_start, period_end, total, status, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, team_id, period_start, period_end, total, status, created_at
        "#,
    )
    .bind(invoice.id)
    .bind(invoice.team_id)
    .bind(invoice.period_start)
    .bind(invoice.period_end)
    .bind(invoice.total)
    .bind(invoice.status)
    .bind(invoice.created_at)
    .fetch_one(&mut **transaction)
    .await?;
    Ok(created)
}

/// Insert an invoice line item within an existing transaction.
pub async fn create_line_item_tx(
    transaction: &mut Transaction<'_, Postgres>,
    line_item: &InvoiceLineItem,
) -> std::result::Result<InvoiceLineItem, sqlx::Error> {
    let created = sqlx::query_as::<_, InvoiceLineItem>(
        r#"
        INSERT INTO invoice_line_items (id, invoice_id, user_id, tokens_used, cost)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, invoice_id, user_id, tokens_used, cost
        "#,
    )
    .bind(line_item.id)
    .bind(line_item.invoice_id)
    .bind(line_item.user_id)
    .bind(line_item.tokens_used)
    .bind(line_item.cost)
    .fetch_one(&mut **transaction)
    .await?;
    Ok(created)
}

/// Fetch an invoice by ID with a row lock, within an existing transaction.
/// The lock serializes concurrent payment attempts on the same invoice.
pub async fn get_invoice_by_id_tx(
    transaction: &mut Transaction<'_, Postgres>,
    invoice_id: Uuid,
) -> std::result::Result<Option<Invoice>, sqlx::Error> {
    let row = sqlx::query_as::<_, Invoice>(
        r#"
        SELECT id, team_id, period_start, period_end, total, status, created_at
        FROM invoices
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(invoice_id)
    .fetch_optional(&mut **transaction)
    .await?;
    Ok(row)
}

/// Set an invoice's status to `paid` within an existing transaction.
///
/// The write is unconditional: repeated payments re-assert the terminal
/// status without changing it, so the invoice transitions at most once
/// logically.
pub async fn mark_invoice_paid_tx(
    transaction: &mut Transaction<'_, Postgres>,
    invoice_id: Uuid,
) -> std::result::Result<Invoice, sqlx::Error> {
    let updated = sqlx::query_as::<_, Invoice>(
        r#"
        UPDATE invoices
        SET status = $2
        WHERE id = $1
        RETURNING id, team_id, period_start, period_end, total, status, created_at
        "#,
    )
    .bind(invoice_id)
    .bind(InvoiceState::Paid)
    .fetch_one(&mut **transaction)
    .await?;
    Ok(updated)
}

/// Insert a payment row within an existing transaction.
pub async fn create_payment_tx(
    transaction: &mut Transaction<'_, Postgres>,
    payment: &Payment,
) -> std::result::Result<Payment, sqlx::Error> {
    let created = sqlx::query_as::<_, Payment>(
        r#"
        INSERT INTO payments (id, invoice_id, method, amount, status, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, invoice_id, method, amount, status, created_at
        "#,
    )
    .bind(payment.id)
    .bind(payment.invoice_id)
    .bind(&payment.method)
    .bind(payment.amount)
    .bind(payment.status)
    .bind(payment.created_at)
    .fetch_one(&mut **transaction)
    .await?;
    Ok(created)
}
