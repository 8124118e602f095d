//! Host — one backend target a domain's traffic may be dispatched to.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::HostmapError;
use crate::validation::{ValidationErrors, Violation};

const ALLOWED_SCHEMES: [&str; 4] = ["http", "https", "ws", "wss"];

/// Characters that would end or extend an nginx directive when the value is
/// written into a `location` or `proxy_pass` line.
const DIRECTIVE_METACHARACTERS: [char; 7] = ['{', '}', ';', '#', '"', '\'', '\\'];

/// How the consuming proxy should treat the upstream connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostType {
    /// Plain HTTP proxying.
    #[default]
    Default,
    /// Upgrade-capable connection (`Upgrade` / `Connection` headers forwarded).
    Websocket,
}

impl HostType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Websocket => "websocket",
        }
    }
}

impl fmt::Display for HostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HostType {
    type Err = Violation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" => Ok(Self::Default),
            "websocket" => Ok(Self::Websocket),
            _ => Err(Violation::UnknownVariant {
                value: s.to_string(),
                expected: "default or websocket",
            }),
        }
    }
}

/// A validated backend target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Host {
    #[serde(rename = "type", default)]
    pub host_type: HostType,
    /// Absolute URL of the upstream, kept exactly as submitted (trimmed).
    pub address: String,
    pub path_prefix: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Host {
    /// Create a builder for constructing a [`Host`].
    #[must_use]
    pub fn builder() -> HostBuilder {
        HostBuilder::default()
    }
}

/// Untrusted host payload. Every field is optional so that validation can
/// report all missing or malformed fields in one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostCandidate {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub host_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl From<Host> for HostCandidate {
    fn from(host: Host) -> Self {
        Self {
            host_type: Some(host.host_type.as_str().to_string()),
            address: Some(host.address),
            path_prefix: Some(host.path_prefix),
            name: host.name,
        }
    }
}

/// Validate one host candidate.
///
/// `type` defaults to [`HostType::Default`] when omitted.
///
/// # Errors
///
/// Returns one [`FieldError`](crate::validation::FieldError) per offending
/// field (`type`, `address`, `pathPrefix`, `name`).
pub fn validate_host(candidate: &HostCandidate) -> Result<Host, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let host_type = errors.capture(
        "type",
        candidate
            .host_type
            .as_deref()
            .map_or(Ok(HostType::Default), str::parse),
    );
    let address = errors.capture("address", parse_address(candidate.address.as_deref()));
    let path_prefix = errors.capture(
        "pathPrefix",
        parse_path_prefix(candidate.path_prefix.as_deref()),
    );
    let name = errors.capture("name", parse_name(candidate.name.as_deref()));

    errors.finish(|| {
        Some(Host {
            host_type: host_type?,
            address: address?,
            path_prefix: path_prefix?,
            name: name?,
        })
    })
}

fn parse_address(raw: Option<&str>) -> Result<String, Violation> {
    let raw = raw.ok_or(Violation::Required)?.trim();
    if raw.is_empty() {
        return Err(Violation::Empty);
    }
    reject_directive_breakers(raw)?;
    let url = Url::parse(raw).map_err(Violation::InvalidUrl)?;
    if !ALLOWED_SCHEMES.contains(&url.scheme()) {
        return Err(Violation::UnsupportedScheme(url.scheme().to_string()));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(Violation::MissingHost);
    }
    Ok(raw.to_string())
}

fn parse_path_prefix(raw: Option<&str>) -> Result<String, Violation> {
    let raw = raw.ok_or(Violation::Required)?;
    if raw.is_empty() {
        return Err(Violation::Empty);
    }
    if !raw.starts_with('/') {
        return Err(Violation::MissingLeadingSlash);
    }
    reject_directive_breakers(raw)?;
    Ok(raw.to_string())
}

/// Addresses and prefixes are emitted verbatim into proxy configuration, so
/// they may not contain whitespace, control characters, `$` or directive
/// metacharacters.
pub(crate) fn reject_directive_breakers(raw: &str) -> Result<(), Violation> {
    match raw.chars().find(|c| {
        c.is_whitespace() || c.is_control() || *c == '$' || DIRECTIVE_METACHARACTERS.contains(c)
    }) {
        Some(c) => Err(Violation::ForbiddenCharacter(c)),
        None => Ok(()),
    }
}

fn parse_name(raw: Option<&str>) -> Result<Option<String>, Violation> {
    match raw.map(str::trim) {
        None => Ok(None),
        Some("") => Err(Violation::Empty),
        Some(name) => Ok(Some(name.to_string())),
    }
}

/// Step-by-step builder for [`Host`].
#[derive(Debug, Default)]
pub struct HostBuilder {
    candidate: HostCandidate,
}

impl HostBuilder {
    #[must_use]
    pub fn host_type(mut self, host_type: HostType) -> Self {
        self.candidate.host_type = Some(host_type.as_str().to_string());
        self
    }

    #[must_use]
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.candidate.address = Some(address.into());
        self
    }

    #[must_use]
    pub fn path_prefix(mut self, path_prefix: impl Into<String>) -> Self {
        self.candidate.path_prefix = Some(path_prefix.into());
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.candidate.name = Some(name.into());
        self
    }

    /// Consume the builder, validate, and return a [`Host`].
    ///
    /// # Errors
    ///
    /// Returns [`HostmapError::Validation`] if any field is missing or malformed.
    pub fn build(self) -> Result<Host, HostmapError> {
        Ok(validate_host(&self.candidate)?)
    }
}
