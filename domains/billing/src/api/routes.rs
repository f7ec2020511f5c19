//! Route definitions for Billing domain API

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{invoices, usage};
use super::middleware::BillingState;

/// Create usage ledger routes
fn usage_routes() -> Router<BillingState> {
    Router::new()
        .route("/v1/usage", post(usage::log_usage))
        .route("/v1/teams/{team_id}/usage", get(usage::list_team_usage))
}

/// Create invoice and payment routes
fn invoice_routes() -> Router<BillingState> {
    Router::new()
        .route("/v1/invoices", post(invoices::generate_invoice))
        .route("/v1/invoices/{invoice_id}", get(invoices::get_invoice))
        .route("/v1/invoices/{invoice_id}/pdf", get(invoices::invoice_pdf))
        .route("/v1/invoices/{invoice_id}/pay", post(invoices::pay_invoice))
        .route(
            "/v1/teams/{team_id}/invoices",
            get(invoices::list_team_invoices),
        )
}

/// Create all Billing domain API routes
pub fn routes() -> Router<BillingState> {
    Router::new().merge(usage_routes()).merge(invoice_routes())
}
