//! API layer for the Billing domain

pub mod handlers;
pub mod middleware;
pub mod routes;

pub use middleware::BillingState;
pub use routes::routes;
