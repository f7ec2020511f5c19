//! API handlers for the Billing domain

pub mod invoices;
pub mod usage;
