//! Route definitions for Teams domain API

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{memberships, teams};
use super::middleware::TeamsState;

/// Create team management routes
fn team_routes() -> Router<TeamsState> {
    Router::new()
        .route("/v1/teams", post(teams::create_team))
        .route("/v1/teams/{team_id}/api-key", get(teams::get_api_key))
}

/// Create team membership routes
fn membership_routes() -> Router<TeamsState> {
    Router::new()
        .route(
            "/v1/teams/{team_id}/members",
            get(memberships::list_members),
        )
        .route(
            "/v1/teams/{team_id}/invitations",
            get(memberships::list_invitations).post(memberships::invite_member),
        )
        .route(
            "/v1/invitations/accept",
            post(memberships::accept_invitation),
        )
}

/// Create all Teams domain API routes
pub fn routes() -> Router<TeamsState> {
    Router::new().merge(team_routes()).merge(membership_routes())
}
