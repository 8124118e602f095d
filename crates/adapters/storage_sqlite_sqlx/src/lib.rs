//! # hostmap-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the `DomainRepository` port defined in `hostmap-app::ports::storage`
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Map between domain types and database rows
//!
//! ## Dependency rule
//! Depends on `hostmap-app` (for port traits) and `hostmap-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

mod domain_repo;
mod error;
mod pool;

pub use domain_repo::SqliteDomainRepository;
pub use error::StorageError;
pub use pool::{Config, Database};
