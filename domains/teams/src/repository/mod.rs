//! Repository implementations for the Teams domain

pub mod invitations;
pub mod memberships;
pub mod teams;
pub mod transactions;

use sqlx::{PgPool, Postgres, Transaction};

pub use invitations::InvitationRepository;
pub use memberships::MembershipRepository;
pub use teams::TeamRepository;
pub use transactions::{
    create_membership_tx, create_team_tx, get_invitation_by_token_tx, mark_invitation_accepted_tx,
};

/// Combined repository access for the Teams domain
#[derive(Clone)]
pub struct TeamsRepositories {
    pool: PgPool,
    pub teams: TeamRepository,
    pub memberships: MembershipRepository,
    pub invitations: InvitationRepository,
}

impl TeamsRepositories {
    pub fn new(pool: PgPool) -> Self {
        Self {
            teams: TeamRepository::new(pool.clone()),
            memberships: MembershipRepository::new(pool.clone()),
            invitations: InvitationRepository::new(pool.clone()),
            pool,
        }
    }

    /// Begin a new database transaction.
    pub async fn begin(&self) -> std::result::Result<Transaction<'static, Postgres>, sqlx::Error> {
        self.pool.begin().await
    }
}
