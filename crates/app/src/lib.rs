//! Tallybook application composition root
//!
//! Composes all domain routers into a single application.

use axum::Router;
use sqlx::PgPool;
use tallybook_billing::{BillingRepositories, BillingState};
use tallybook_common::Config;
use tallybook_teams::{TeamsRepositories, TeamsState};

/// Create the main application router with all routes and middleware
pub async fn create_app(config: Config, pool: PgPool) -> Result<Router, anyhow::Error> {
    // Create Teams domain state
    let teams_state = TeamsState {
        repos: TeamsRepositories::new(pool.clone()),
    };

    // Create Billing domain state
    let billing_state = BillingState {
        repos: BillingRepositories::new(pool),
        app_base_url: config.app_base_url,
    };

    // Build router — compose domain routers with shared infrastructure routes
    let app = Router::new()
        .route("/health", axum::routing::get(health_check))
        .route(
            "/",
            axum::routing::get(|| async { "Tallybook API v0.1.0" }),
        )
        .merge(tallybook_teams::routes().with_state(teams_state))
        .merge(tallybook_billing::routes().with_state(billing_state));

    Ok(app)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
