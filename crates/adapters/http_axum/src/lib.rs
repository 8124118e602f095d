//! # hostmap-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve a **JSON API** over the domain registry
//!   (`/api/domains`, `/api/routing-table`, …)
//! - Require an opaque bearer token on mutating routes when one is configured
//! - Map HTTP requests into registry calls (driving adapter)
//! - Map registry results and errors into HTTP responses
//!
//! ## Dependency rule
//! Depends on `hostmap-app` (for port traits and services) and `hostmap-domain`
//! (for domain types used in request/response mapping). Never leaks axum types
//! into the domain.

pub mod api;
pub mod auth;
pub mod error;
pub mod extract;
pub mod router;
pub mod state;
