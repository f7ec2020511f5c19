//! Domain layer for the Teams domain

pub mod entities;
pub mod state;
