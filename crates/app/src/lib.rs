//! # hostmap-app
//!
//! Application layer — use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define the **persistence port** adapters must implement:
//!   - `DomainRepository` — point lookup, full scan, insert-if-absent,
//!     compare-and-swap update, delete-if-present
//! - Define the **driving port** as a use-case struct:
//!   - `DomainRegistry` — create, list, get, update, replace, delete, import,
//!     routing table
//! - Orchestrate domain objects without knowing *how* persistence works
//!
//! ## Dependency rule
//! Depends on `hostmap-domain` only.
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod ports;
pub mod services;
