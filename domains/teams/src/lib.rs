//! Teams domain: teams, memberships, invitations

pub mod api;
pub mod domain;
pub mod repository;

// Re-export domain types at the crate root for convenience
pub use domain::entities::*;
pub use domain::state::{
    InvitationEvent, InvitationState, InvitationStateMachine, StateError,
};
// Re-export repository types
pub use repository::{
    create_membership_tx, create_team_tx, get_invitation_by_token_tx,
    mark_invitation_accepted_tx, InvitationRepository, MembershipRepository, TeamRepository,
    TeamsRepositories,
};

// Re-export API types
pub use api::routes;
pub use api::TeamsState;
