//! Shared database types for Tallybook
//!
//! This module provides common database-related types used across domain
//! repositories, plus the transient-failure classification used by the
//! retry policy for purely-additive writes.

use crate::error::Error;
use thiserror::Error;

/// Database-specific error types
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Record not found")]
    NotFound,

    #[error("Record already exists")]
    AlreadyExists,

    #[error("Database connection error: {0}")]
    Connection(#[from] sqlx::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl From<RepositoryError> for Error {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Error::NotFound("Record not found".to_string()),
            RepositoryError::AlreadyExists => Error::Conflict("Record already exists".to_string()),
            RepositoryError::Connection(e) => Error::Database(e),
            RepositoryError::InvalidData(msg) => Error::Invalid(msg),
        }
    }
}

/// Classify a storage error as transient (connection loss, pool exhaustion).
///
/// Transient failures are eligible for automatic retry only on read-only or
/// purely-additive operations, where a retry cannot duplicate a side effect.
/// Token consumption and payment recording are never retried.
pub fn is_transient(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed
    )
}
