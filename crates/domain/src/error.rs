//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`HostmapError`]
//! via `#[from]`; adapters box their failures into [`HostmapError::Storage`].

use crate::validation::ValidationErrors;

/// Top-level error returned by every registry operation.
#[derive(Debug, thiserror::Error)]
pub enum HostmapError {
    /// The candidate broke one or more field constraints. Nothing was written.
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    /// A uniqueness or concurrent-write rule rejected the mutation.
    #[error(transparent)]
    Conflict(#[from] ConflictError),

    /// The referenced record does not exist.
    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    /// The persistence collaborator could not complete the operation.
    #[error("storage failure")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// A write lost against the current state of the registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConflictError {
    /// Another domain already owns this identifier.
    #[error("domain `{identifier}` already exists")]
    IdentifierTaken { identifier: String },

    /// The record changed between read and compare-and-swap.
    #[error("domain `{identifier}` was modified concurrently")]
    ConcurrentModification { identifier: String },
}

/// The record referenced by `key` is absent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} `{key}` not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub key: String,
}

impl NotFoundError {
    #[must_use]
    pub fn domain(key: impl Into<String>) -> Self {
        Self {
            entity: "Domain",
            key: key.into(),
        }
    }
}
