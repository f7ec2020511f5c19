//! Shared utilities, configuration, and error handling for Tallybook

pub mod config;
pub mod db;
pub mod error;
pub mod extractors;

pub use config::Config;
pub use db::{is_transient, RepositoryError};
pub use error::{Error, Result};
pub use extractors::{CallerId, ValidatedJson};
