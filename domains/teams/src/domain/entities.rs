//! Domain entities for the Tallybook teams domain
//!
//! A team is the tenant boundary: it owns its members, invitations, usage
//! records, and invoices. Users are external identities referenced by UUID;
//! the core stores no user table.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tallybook_common::{Error, Result};
use validator::ValidateEmail;

pub use crate::domain::state::InvitationState;
use crate::domain::state::{InvitationEvent, InvitationStateMachine, StateError};

/// Membership roles within a team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "member_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Owner,
    Admin,
    #[default]
    Member,
}

impl std::fmt::Display for MemberRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MemberRole::Owner => write!(f, "owner"),
            MemberRole::Admin => write!(f, "admin"),
            MemberRole::Member => write!(f, "member"),
        }
    }
}

impl MemberRole {
    /// Check if this role is owner
    pub fn is_owner(&self) -> bool {
        matches!(self, MemberRole::Owner)
    }

    /// Check if this role can invite users
    pub fn can_invite(&self) -> bool {
        matches!(self, MemberRole::Owner | MemberRole::Admin)
    }
}

/// Team entity — the root of a tenant's data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Team {
    pub id: Uuid,
    pub name: String,
    pub owner_id: Uuid,
    /// Opaque secret for the team; rotatable only by recreating the team
    pub api_key: String,
    pub created_at: DateTime<Utc>,
}

impl Team {
    /// Create a new team with a freshly generated API key
    pub fn new(name: String, owner_id: Uuid) -> Result<Self> {
        if name.is_empty() || name.len() > 100 {
            return Err(Error::Invalid(
                "Team name must be 1-100 characters".to_string(),
            ));
        }

        Ok(Team {
            id: Uuid::new_v4(),
            name,
            owner_id,
            api_key: generate_api_key()?,
            created_at: Utc::now(),
        })
    }
}

/// Generate an opaque team API key: `sk_live_` + 24 random bytes, hex encoded
fn generate_api_key() -> Result<String> {
    let mut key_bytes = [0u8; 24];
    getrandom::getrandom(&mut key_bytes)
        .map_err(|e| Error::Internal(format!("Failed to generate random bytes: {}", e)))?;
    Ok(format!("sk_live_{}", hex::encode(key_bytes)))
}

/// Member entity — a user's role-scoped association with a team.
///
/// Keyed by `(team_id, user_id)`: a user belongs to a team at most once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Member {
    pub team_id: Uuid,
    pub user_id: Uuid,
    pub role: MemberRole,
    pub joined_at: DateTime<Utc>,
}

impl Member {
    /// Create a new membership
    pub fn new(team_id: Uuid, user_id: Uuid, role: MemberRole) -> Self {
        Member {
            team_id,
            user_id,
            role,
            joined_at: Utc::now(),
        }
    }
}

/// Invitation entity — a single-use join token bound to a team, email, and role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Invitation {
    pub id: Uuid,
    pub team_id: Uuid,
    pub email: String,
    pub role: MemberRole,
    pub inviter_id: Uuid,
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub accepted: bool,
}

impl Invitation {
    /// Create a new invitation with a freshly generated token
    pub fn new(team_id: Uuid, email: String, role: MemberRole, inviter_id: Uuid) -> Result<Self> {
        if !email.validate_email() {
            return Err(Error::Invalid("Invalid email format".to_string()));
        }

        // Generate secure token: 32 random bytes, URL-safe base64 encoded (43 chars)
        let mut token_bytes = [0u8; 32];
        getrandom::getrandom(&mut token_bytes)
            .map_err(|e| Error::Internal(format!("Failed to generate random bytes: {}", e)))?;
        let token = URL_SAFE_NO_PAD.encode(token_bytes);

        Ok(Invitation {
            id: Uuid::new_v4(),
            team_id,
            email,
            role,
            inviter_id,
            token,
            created_at: Utc::now(),
            accepted: false,
        })
    }

    /// Get current invitation state
    pub fn state(&self) -> InvitationState {
        if self.accepted {
            InvitationState::Accepted
        } else {
            InvitationState::Created
        }
    }

    /// Accept the invitation, consuming the token
    pub fn accept(&mut self) -> Result<()> {
        InvitationStateMachine::transition(self.state(), InvitationEvent::Accept).map_err(|e| {
            match e {
                StateError::TerminalState(_) => {
                    Error::Conflict("Invitation already accepted".to_string())
                }
                StateError::InvalidTransition { from, event } => Error::Conflict(format!(
                    "Invalid invitation transition: cannot apply '{}' event from '{}' state",
                    event, from
                )),
            }
        })?;
        self.accepted = true;
        Ok(())
    }
}
