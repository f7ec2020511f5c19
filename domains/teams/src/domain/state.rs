//! State machine for team invitations
//!
//! An invitation is a single-use join token. It starts in `Created` and
//! moves to `Accepted` exactly once; `Accepted` is terminal. There is no
//! decline, expiry, or revoke state in the base design.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during state transitions
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StateError {
    #[error("Invalid transition: cannot transition from {from} via {event}")]
    InvalidTransition { from: String, event: String },

    #[error("Terminal state: {0} is a terminal state and cannot transition")]
    TerminalState(String),
}

/// Invitation states, derived from the stored `accepted` flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvitationState {
    Created,
    Accepted,
}

impl InvitationState {
    /// Check if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Accepted)
    }

    /// Get all valid next states from current state
    pub fn valid_transitions(&self) -> &'static [InvitationState] {
        match self {
            Self::Created => &[Self::Accepted],
            Self::Accepted => &[],
        }
    }
}

impl std::fmt::Display for InvitationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Accepted => write!(f, "accepted"),
        }
    }
}

/// Events that trigger invitation state transitions
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InvitationEvent {
    /// A user consumes the token and joins the team
    Accept,
}

impl std::fmt::Display for InvitationEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Accept => write!(f, "accept"),
        }
    }
}

/// Invitation state machine
pub struct InvitationStateMachine;

impl InvitationStateMachine {
    /// Attempt a state transition
    pub fn transition(
        current: InvitationState,
        event: InvitationEvent,
    ) -> Result<InvitationState, StateError> {
        if current.is_terminal() {
            return Err(StateError::TerminalState(current.to_string()));
        }

        match (&current, &event) {
            (InvitationState::Created, InvitationEvent::Accept) => Ok(InvitationState::Accepted),
            // Unreachable: terminal states are rejected above.
            (InvitationState::Accepted, _) => Err(StateError::TerminalState(current.to_string())),
        }
    }

    /// Check if a transition is valid without performing it
    pub fn can_transition(current: InvitationState, event: &InvitationEvent) -> bool {
        Self::transition(current, *event).is_ok()
    }
}
