//! Domain entities for the Tallybook billing domain
//!
//! The usage ledger is append-only: records are stored verbatim, never
//! deduplicated, and retrievable in durable commit order per team. Invoices
//! snapshot a half-open window of the ledger; line items and payments never
//! outlive their invoice.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tallybook_common::{Error, Result};

pub use crate::domain::state::InvoiceState;

/// Payment attempt states; the base design records settled attempts only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Paid,
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Paid => write!(f, "paid"),
        }
    }
}

/// Usage record entity — one billable event in the append-only ledger.
///
/// `seq` is assigned by the store at insert time and is monotone per store,
/// which gives per-team retrieval in durable commit order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UsageRecord {
    pub id: Uuid,
    pub team_id: Uuid,
    pub user_id: Uuid,
    pub usage_type: String,
    pub amount: f64,
    pub unit: String,
    pub cost: Decimal,
    pub recorded_at: DateTime<Utc>,
    /// Store-assigned insertion sequence; 0 until persisted
    #[serde(default)]
    pub seq: i64,
}

impl UsageRecord {
    /// Create a new usage record, validating the billable quantities
    pub fn new(
        team_id: Uuid,
        user_id: Uuid,
        usage_type: String,
        amount: f64,
        unit: String,
        cost: Decimal,
    ) -> Result<Self> {
        if usage_type.is_empty() {
            return Err(Error::Invalid("Usage type must not be empty".to_string()));
        }
        if unit.is_empty() {
            return Err(Error::Invalid("Unit must not be empty".to_string()));
        }
        if !amount.is_finite() || amount < 0.0 {
            return Err(Error::Invalid(
                "Amount must be a non-negative number".to_string(),
            ));
        }
        if cost < Decimal::ZERO {
            return Err(Error::Invalid("Cost must be non-negative".to_string()));
        }

        Ok(UsageRecord {
            id: Uuid::new_v4(),
            team_id,
            user_id,
            usage_type,
            amount,
            unit,
            cost,
            recorded_at: Utc::now(),
            seq: 0,
        })
    }
}

/// Invoice entity — one aggregation pass over a `[period_start, period_end)`
/// window for one team. Immutable once created except for the status
/// transition driven by payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Invoice {
    pub id: Uuid,
    pub team_id: Uuid,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    /// Invariant: equals the sum of this invoice's line-item costs
    pub total: Decimal,
    pub status: InvoiceState,
    pub created_at: DateTime<Utc>,
}

impl Invoice {
    /// Create a new pending invoice for a window
    pub fn new(
        team_id: Uuid,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
        total: Decimal,
    ) -> Result<Self> {
        if period_start >= period_end {
            return Err(Error::Invalid(
                "Invoice period start must precede period end".to_string(),
            ));
        }

        Ok(Invoice {
            id: Uuid::new_v4(),
            team_id,
            period_start,
            period_end,
            total,
            status: InvoiceState::Pending,
            created_at: Utc::now(),
        })
    }

    pub fn is_paid(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Invoice line item — one per distinct user with usage inside the window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct InvoiceLineItem {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub user_id: Uuid,
    pub tokens_used: f64,
    pub cost: Decimal,
}

impl InvoiceLineItem {
    pub fn new(invoice_id: Uuid, user_id: Uuid, tokens_used: f64, cost: Decimal) -> Self {
        InvoiceLineItem {
            id: Uuid::new_v4(),
            invoice_id,
            user_id,
            tokens_used,
            cost,
        }
    }
}

/// Payment entity — one recorded attempt at settling an invoice.
///
/// An invoice may accumulate multiple payment rows; it is settled once its
/// own status is `paid`, driven by the first successful attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Payment {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub method: String,
    pub amount: Decimal,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    /// Record a settled payment attempt for the invoice's full amount
    pub fn new(invoice_id: Uuid, method: String, amount: Decimal) -> Result<Self> {
        if method.is_empty() {
            return Err(Error::Invalid(
                "Payment method must not be empty".to_string(),
            ));
        }

        Ok(Payment {
            id: Uuid::new_v4(),
            invoice_id,
            method,
            amount,
            status: PaymentStatus::Paid,
            created_at: Utc::now(),
        })
    }
}
