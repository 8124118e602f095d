//! # hostmap-domain
//!
//! Pure domain model for the hostmap routing registry.
//!
//! ## Responsibilities
//! - Foundational types: error conventions, field-level validation errors, timestamps
//! - Define **Domains** (a routable DNS name plus its ordered backend hosts)
//! - Define **Hosts** (one backend endpoint qualified by a path prefix and a connection type)
//! - Turn untrusted candidate payloads into canonical values, reporting every
//!   offending field at once
//! - Upgrade payloads written against older **schema versions**
//! - Build the **routing table** a downstream reverse proxy consumes
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod time;
pub mod validation;

pub mod domain;
pub mod host;
pub mod routing_table;
pub mod schema;
