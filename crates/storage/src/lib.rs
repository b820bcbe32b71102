//! Storage Layer
//!
//! Durable cooldown state on SQLite, plus a backend-agnostic store that
//! picks memory or SQLite from a connection URL.

mod repository;

pub use repository::{AnyCooldownStore, SqliteCooldownStore};

use alerting::CooldownError;
use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Unsupported cooldown store URL: {0}")]
    UnsupportedBackend(String),
    #[error("Corrupt record: {0}")]
    CorruptRecord(String),
}

impl From<sqlx::Error> for StorageError {
    fn from(e: sqlx::Error) -> Self {
        StorageError::DatabaseError(e.to_string())
    }
}

impl From<StorageError> for CooldownError {
    fn from(e: StorageError) -> Self {
        CooldownError::Backend(e.to_string())
    }
}
