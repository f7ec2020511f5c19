//! State machine for invoices
//!
//! An invoice starts in `Pending` and moves to `Paid` via payment. `Paid` is
//! terminal at the status level, but repeated `Pay` events are accepted and
//! simply leave the status where it is — settling an already-settled invoice
//! records another payment attempt without a second transition.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during state transitions
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StateError {
    #[error("Invalid transition: cannot transition from {from} via {event}")]
    InvalidTransition { from: String, event: String },
}

/// Invoice states, stored directly as the `invoice_status` column
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, Default,
)]
#[sqlx(type_name = "invoice_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InvoiceState {
    #[default]
    Pending,
    Paid,
}

impl InvoiceState {
    /// Check if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Paid)
    }

    /// Get all valid next states from current state
    pub fn valid_transitions(&self) -> &'static [InvoiceState] {
        match self {
            Self::Pending => &[Self::Paid],
            Self::Paid => &[],
        }
    }
}

impl std::fmt::Display for InvoiceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Paid => write!(f, "paid"),
        }
    }
}

/// Events that trigger invoice state transitions
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InvoiceEvent {
    /// A payment attempt settles the invoice
    Pay,
}

impl std::fmt::Display for InvoiceEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pay => write!(f, "pay"),
        }
    }
}

/// Invoice state machine
pub struct InvoiceStateMachine;

impl InvoiceStateMachine {
    /// Apply an event to a state.
    ///
    /// `Pay` on an already-`Paid` invoice is a no-op transition, not an
    /// error: payment attempts after settlement are accepted, the status
    /// just stays terminal.
    pub fn transition(
        current: InvoiceState,
        event: InvoiceEvent,
    ) -> Result<InvoiceState, StateError> {
        match (&current, &event) {
            (InvoiceState::Pending, InvoiceEvent::Pay) => Ok(InvoiceState::Paid),
            (InvoiceState::Paid, InvoiceEvent::Pay) => Ok(InvoiceState::Paid),
        }
    }

    /// Check if a transition is valid without performing it
    pub fn can_transition(current: InvoiceState, event: &InvoiceEvent) -> bool {
        Self::transition(current, *event).is_ok()
    }
}
