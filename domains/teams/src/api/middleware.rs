//! Teams domain application state

use crate::TeamsRepositories;

/// Application state for the Teams domain
#[derive(Clone)]
pub struct TeamsState {
    pub repos: TeamsRepositories,
}
