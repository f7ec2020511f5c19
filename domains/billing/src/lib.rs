//! Billing domain: usage ledger, invoices, payments

pub mod api;
pub mod domain;
pub mod repository;

// Re-export domain types at the crate root for convenience
pub use domain::aggregate::{
    invoice_total, summarize_by_user, BillingPeriod, UsageSummary,
};
pub use domain::entities::*;
pub use domain::state::{InvoiceEvent, InvoiceState, InvoiceStateMachine, StateError};

// Re-export repository types
pub use repository::{
    create_invoice_tx, create_line_item_tx, create_payment_tx, get_invoice_by_id_tx,
    mark_invoice_paid_tx, usage_in_window_tx, BillingRepositories, InvoiceRepository,
    PaymentRepository, UsageRecordRepository,
};

// Re-export API types
pub use api::routes;
pub use api::BillingState;
