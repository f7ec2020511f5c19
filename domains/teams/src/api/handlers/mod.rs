//! API handlers for the Teams domain

pub mod memberships;
pub mod teams;
