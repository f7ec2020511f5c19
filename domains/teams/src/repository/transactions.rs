//! Transactional free functions for the Teams domain (Zero2Prod pattern)
//!
//! Each invariant-preserving cross-record write runs through these inside a
//! single `sqlx::Transaction`: team + owner creation, and invitation
//! acceptance (token CAS + member insert). Dropping the transaction without
//! commit rolls everything back.

use crate::domain::entities::{Invitation, Member, Team};
use sqlx::{Postgres, Transaction};
use tallybook_common::RepositoryError;
use uuid::Uuid;

/// Insert a team row within an existing transaction.
pub async fn create_team_tx(
    transaction: &mut Transaction<'_, Postgres>,
    team: &Team,
) -> std::result::Result<Team, sqlx::Error> {
    let created = sqlx::query_as::<_, Team>(
        r#"
        INSERT INTO teams (id, name, owner_id, api_key, created_at)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, name, owner_id, api_key, created_at
        "#,
    )
    .bind(team.id)
    .bind(&team.name)
    .bind(team.owner_id)
    .bind(&team.api_key)
    .bind(team.created_at)
    .fetch_one(&mut **transaction)
    .await?;
    Ok(created)
}

/// Insert a membership row within an existing transaction.
pub async fn create_membership_tx(
    transaction: &mut Transaction<'_, Postgres>,
    member: &Member,
) -> std::result::Result<Member, sqlx::Error> {
    let created = sqlx::query_as::<_, Member>(
        r#"
        INSERT INTO memberships (team_id, user_id, role, joined_at)
        VALUES ($1, $2, $3, $4)
        RETURNING team_id, user_id, role, joined_at
        "#,
    )
    .bind(member.team_id)
    .bind(member.user_id)
    .bind(member.role)
    .bind(member.joined_at)
    .fetch_one(&mut **transaction)
    .await?;
    Ok(created)
}

/// Fetch an invitation by token with a row lock, within an existing
/// transaction. The lock serializes concurrent acceptance attempts on the
/// same token.
pub async fn get_invitation_by_token_tx(
    transaction: &mut Transaction<'_, Postgres>,
    token: &str,
) -> std::result::Result<Option<Invitation>, sqlx::Error> {
    let row = sqlx::query_as::<_, Invitation>(
        r#"
        SELECT id, team_id, email, role, inviter_id, token, created_at, accepted
        FROM invitations
        WHERE token = $1
        FOR UPDATE
        "#,
    )
    .bind(token)
    .fetch_optional(&mut **transaction)
    .await?;
    Ok(row)
}

/// Consume an invitation token within an existing transaction.
///
/// Compare-and-set on `accepted`: the guard `accepted = FALSE` guarantees
/// that of two concurrent acceptance attempts exactly one flips the flag.
/// Returns `RepositoryError::AlreadyExists` when the token was consumed by
/// a concurrent winner.
pub async fn mark_invitation_accepted_tx(
    transaction: &mut Transaction<'_, Postgres>,
    invitation_id: Uuid,
) -> std::result::Result<(), RepositoryError> {
    let result = sqlx::query(
        r#"
        UPDATE invitations
        SET accepted = TRUE
        WHERE id = $1 AND accepted = FALSE
        "#,
    )
    .bind(invitation_id)
    .execute(&mut **transaction)
    .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::AlreadyExists);
    }
    Ok(())
}
