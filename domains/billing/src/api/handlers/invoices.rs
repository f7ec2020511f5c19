//! Invoice and payment API handlers
//!
//! Invoice generation reads its ledger snapshot and writes the invoice plus
//! line items in one transaction, so a partial invoice is never observable.
//! Payment flips the invoice status and records the attempt atomically.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tallybook_common::{Error, Result, ValidatedJson};
use uuid::Uuid;
use validator::Validate;

use crate::api::middleware::BillingState;
use crate::domain::aggregate::{invoice_total, summarize_by_user, BillingPeriod};
use crate::{
    create_invoice_tx, create_line_item_tx, create_payment_tx, get_invoice_by_id_tx,
    mark_invoice_paid_tx, usage_in_window_tx, Invoice, InvoiceLineItem, InvoiceState, Payment,
    PaymentStatus,
};

/// Request for generating an invoice
///
/// The window defaults to the calendar month containing "now"; supplying
/// only one boundary is rejected.
#[derive(Debug, Deserialize, Validate)]
pub struct GenerateInvoiceRequest {
    pub team_id: Uuid,
    pub period_start: Option<DateTime<Utc>>,
    pub period_end: Option<DateTime<Utc>>,
}

/// Per-user subtotal in an invoice response
#[derive(Debug, Serialize)]
pub struct LineItemResponse {
    pub user_id: Uuid,
    pub tokens_used: f64,
    pub cost: Decimal,
}

impl From<InvoiceLineItem> for LineItemResponse {
    fn from(item: InvoiceLineItem) -> Self {
        Self {
            user_id: item.user_id,
            tokens_used: item.tokens_used,
            cost: item.cost,
        }
    }
}

/// A payment attempt in an invoice response
#[derive(Debug, Serialize)]
pub struct PaymentSummary {
    pub payment_id: Uuid,
    pub method: String,
    pub amount: Decimal,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

impl From<Payment> for PaymentSummary {
    fn from(payment: Payment) -> Self {
        Self {
            payment_id: payment.id,
            method: payment.method,
            amount: payment.amount,
            status: payment.status,
            created_at: payment.created_at,
        }
    }
}

/// Response for invoice operations
#[derive(Debug, Serialize)]
pub struct InvoiceResponse {
    pub invoice_id: Uuid,
    pub team_id: Uuid,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub total: Decimal,
    pub status: InvoiceState,
    pub created_at: DateTime<Utc>,
    pub member_breakdown: Vec<LineItemResponse>,
    pub payments: Vec<PaymentSummary>,
}

impl InvoiceResponse {
    fn new(invoice: Invoice, line_items: Vec<InvoiceLineItem>, payments: Vec<Payment>) -> Self {
        Self {
            invoice_id: invoice.id,
            team_id: invoice.team_id,
            period_start: invoice.period_start,
            period_end: invoice.period_end,
            total: invoice.total,
            status: invoice.status,
            created_at: invoice.created_at,
            member_breakdown: line_items.into_iter().map(LineItemResponse::from).collect(),
            payments: payments.into_iter().map(PaymentSummary::from).collect(),
        }
    }
}

/// Invoice summary for team listings; line items come from the single-invoice read
#[derive(Debug, Serialize)]
pub struct InvoiceSummary {
    pub invoice_id: Uuid,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub total: Decimal,
    pub status: InvoiceState,
    pub created_at: DateTime<Utc>,
}

impl From<Invoice> for InvoiceSummary {
    fn from(invoice: Invoice) -> Self {
        Self {
            invoice_id: invoice.id,
            period_start: invoice.period_start,
            period_end: invoice.period_end,
            total: invoice.total,
            status: invoice.status,
            created_at: invoice.created_at,
        }
    }
}

/// Response for the invoice document locator
#[derive(Debug, Serialize)]
pub struct InvoicePdfResponse {
    pub pdf_url: String,
}

/// Request for paying an invoice
#[derive(Debug, Deserialize, Validate)]
pub struct PayInvoiceRequest {
    /// Payment method, e.g. "card"
    #[validate(length(min = 1))]
    pub method: String,
}

/// Response for a recorded payment
#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    pub payment_id: Uuid,
    pub invoice_id: Uuid,
    pub method: String,
    pub amount: Decimal,
    pub status: PaymentStatus,
    pub invoice_status: InvoiceState,
}

/// Generate an invoice for a team's usage window
///
/// **POST /v1/invoices**
///
/// Aggregates the window's ledger rows per user into line items and writes
/// the invoice atomically. An empty window yields a valid zero-total
/// invoice. Deliberately not idempotent per window: calling twice produces
/// two invoices over the same rows.
pub async fn generate_invoice(
    State(state): State<BillingState>,
    ValidatedJson(request): ValidatedJson<GenerateInvoiceRequest>,
) -> Result<(StatusCode, Json<InvoiceResponse>)> {
    if !state.repos.team_exists(request.team_id).await? {
        return Err(Error::NotFound("Team not found".to_string()));
    }

    let period = match (request.period_start, request.period_end) {
        (Some(start), Some(end)) => BillingPeriod::new(start, end)?,
        (None, None) => BillingPeriod::current_month(Utc::now())?,
        _ => {
            return Err(Error::Invalid(
                "Either supply both period boundaries or neither".to_string(),
            ))
        }
    };

    let mut tx = state
        .repos
        .begin()
        .await
        .map_err(|e| Error::Internal(format!("Failed to begin transaction: {}", e)))?;

    // Snapshot read and invoice writes share one transaction
    let records = usage_in_window_tx(&mut tx, request.team_id, &period)
        .await
        .map_err(|e| Error::Internal(format!("Failed to read usage window: {}", e)))?;

    let summaries = summarize_by_user(&records);
    let total = invoice_total(&summaries);

    let invoice = Invoice::new(request.team_id, period.start, period.end, total)?;
    let created = create_invoice_tx(&mut tx, &invoice)
        .await
        .map_err(|e| Error::Internal(format!("Failed to create invoice: {}", e)))?;

    let mut line_items = Vec::with_capacity(summaries.len());
    for summary in &summaries {
        let item = InvoiceLineItem::new(created.id, summary.user_id, summary.tokens_used, summary.cost);
        let created_item = create_line_item_tx(&mut tx, &item)
            .await
            .map_err(|e| Error::Internal(format!("Failed to create line item: {}", e)))?;
        line_items.push(created_item);
    }

    tx.commit()
        .await
        .map_err(|e| Error::Internal(format!("Failed to commit transaction: {}", e)))?;

    tracing::info!(
        team_id = %created.team_id,
        invoice_id = %created.id,
        total = %created.total,
        line_items = line_items.len(),
        "invoice generated"
    );

    Ok((
        StatusCode::CREATED,
        Json(InvoiceResponse::new(created, line_items, Vec::new())),
    ))
}

/// List a team's invoices
///
/// **GET /v1/teams/{team_id}/invoices**
pub async fn list_team_invoices(
    State(state): State<BillingState>,
    Path(team_id): Path<Uuid>,
) -> Result<Json<Vec<InvoiceSummary>>> {
    if !state.repos.team_exists(team_id).await? {
        return Err(Error::NotFound("Team not found".to_string()));
    }

    let invoices = state.repos.invoices.find_by_team(team_id).await?;
    Ok(Json(
        invoices.into_iter().map(InvoiceSummary::from).collect(),
    ))
}

/// Fetch an invoice with its line items
///
/// **GET /v1/invoices/{invoice_id}**
pub async fn get_invoice(
    State(state): State<BillingState>,
    Path(invoice_id): Path<Uuid>,
) -> Result<Json<InvoiceResponse>> {
    let invoice = state
        .repos
        .invoices
        .get_by_id(invoice_id)
        .await?
        .ok_or_else(|| Error::NotFound("Invoice not found".to_string()))?;

    let line_items = state.repos.invoices.find_line_items(invoice_id).await?;
    let payments = state.repos.payments.find_by_invoice(invoice_id).await?;

    Ok(Json(InvoiceResponse::new(invoice, line_items, payments)))
}

/// Return the document locator for an invoice
///
/// **GET /v1/invoices/{invoice_id}/pdf**
///
/// Rendering is an external collaborator's concern; the core only exposes a
/// stable locator built from the configured base URL.
pub async fn invoice_pdf(
    State(state): State<BillingState>,
    Path(invoice_id): Path<Uuid>,
) -> Result<Json<InvoicePdfResponse>> {
    if !state.repos.invoices.exists(invoice_id).await? {
        return Err(Error::NotFound("Invoice not found".to_string()));
    }

    Ok(Json(InvoicePdfResponse {
        pdf_url: format!("{}/invoices/{}.pdf", state.app_base_url, invoice_id),
    }))
}

/// Pay an invoice
///
/// **POST /v1/invoices/{invoice_id}/pay**
///
/// Flips the invoice to `paid` and records the payment attempt for the full
/// invoice amount, in one transaction. Repeat calls are accepted: each
/// records another payment row while the invoice status stays terminal.
pub async fn pay_invoice(
    State(state): State<BillingState>,
    Path(invoice_id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<PayInvoiceRequest>,
) -> Result<Json<PaymentResponse>> {
    let mut tx = state
        .repos
        .begin()
        .await
        .map_err(|e| Error::Internal(format!("Failed to begin transaction: {}", e)))?;

    // Row lock serializes concurrent payments on the same invoice
    let invoice = get_invoice_by_id_tx(&mut tx, invoice_id)
        .await
        .map_err(|e| Error::Internal(format!("Failed to load invoice: {}", e)))?
        .ok_or_else(|| Error::NotFound("Invoice not found".to_string()))?;

    let updated = mark_invoice_paid_tx(&mut tx, invoice.id)
        .await
        .map_err(|e| Error::Internal(format!("Failed to update invoice status: {}", e)))?;

    let payment = Payment::new(invoice.id, request.method, invoice.total)?;
    let created = create_payment_tx(&mut tx, &payment)
        .await
        .map_err(|e| Error::Internal(format!("Failed to record payment: {}", e)))?;

    tx.commit()
        .await
        .map_err(|e| Error::Internal(format!("Failed to commit transaction: {}", e)))?;

    tracing::info!(
        invoice_id = %updated.id,
        payment_id = %created.id,
        amount = %created.amount,
        "payment recorded"
    );

    Ok(Json(PaymentResponse {
        payment_id: created.id,
        invoice_id: created.invoice_id,
        method: created.method,
        amount: created.amount,
        status: created.status,
        invoice_status: updated.status,
    }))
}
