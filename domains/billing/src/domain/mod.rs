//! Domain layer for the Billing domain

pub mod aggregate;
pub mod entities;
pub mod state;
