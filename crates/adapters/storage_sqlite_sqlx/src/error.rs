//! Storage-specific error type wrapping sqlx errors.

use hostmap_domain::error::HostmapError;

/// Errors originating from the `SQLite` storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A query or connection failed.
    #[error("database error")]
    Database(#[from] sqlx::Error),

    /// Failed to encode or decode the stored hosts JSON.
    #[error("JSON serialization error")]
    Json(#[from] serde_json::Error),

    /// The record's revision counter cannot be incremented any further.
    #[error("revision counter exhausted")]
    RevisionExhausted,

    /// Failed to run migrations.
    #[error("migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl From<StorageError> for HostmapError {
    fn from(err: StorageError) -> Self {
        Self::Storage(Box::new(err))
    }
}
