//! Domain — a routable DNS name plus its ordered backend hosts.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::HostmapError;
use crate::host::{Host, HostCandidate, validate_host};
use crate::validation::{ValidationErrors, Violation};

const MAX_NAME_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;

/// Canonical, case-folded DNS name used as the registry key.
///
/// Names are compared case-insensitively by storing them in ASCII lowercase
/// with surrounding whitespace removed. A leading `*.` wildcard label is
/// allowed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DomainName(String);

impl DomainName {
    /// Validate and canonicalise a raw name.
    ///
    /// # Errors
    ///
    /// Returns [`Violation::Empty`] or [`Violation::InvalidDomainName`].
    pub fn parse(raw: &str) -> Result<Self, Violation> {
        let name = Self::canonical(raw);
        if name.is_empty() {
            return Err(Violation::Empty);
        }
        if name.len() > MAX_NAME_LEN {
            return Err(Violation::InvalidDomainName("longer than 253 characters"));
        }

        let labels: Vec<&str> = name.split('.').collect();
        for (idx, label) in labels.iter().enumerate() {
            if idx == 0 && *label == "*" && labels.len() > 1 {
                continue;
            }
            check_label(label)?;
        }
        Ok(Self(name))
    }

    /// Canonical form of `raw` for lookups, without syntax checks.
    #[must_use]
    pub fn canonical(raw: &str) -> String {
        raw.trim().to_ascii_lowercase()
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn check_label(label: &str) -> Result<(), Violation> {
    if label.is_empty() {
        return Err(Violation::InvalidDomainName("contains an empty label"));
    }
    if label.len() > MAX_LABEL_LEN {
        return Err(Violation::InvalidDomainName(
            "has a label longer than 63 characters",
        ));
    }
    if !label
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
    {
        return Err(Violation::InvalidDomainName(
            "may only contain letters, digits, hyphens and dots",
        ));
    }
    if label.starts_with('-') || label.ends_with('-') {
        return Err(Violation::InvalidDomainName(
            "has a label starting or ending with a hyphen",
        ));
    }
    Ok(())
}

impl fmt::Display for DomainName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DomainName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for DomainName {
    type Err = Violation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for DomainName {
    type Error = Violation;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<DomainName> for String {
    fn from(name: DomainName) -> Self {
        name.0
    }
}

/// Deployment tag attached to a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Production,
    Development,
    Staging,
    Testing,
}

impl Environment {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Development => "development",
            Self::Staging => "staging",
            Self::Testing => "testing",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = Violation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" => Ok(Self::Production),
            "development" => Ok(Self::Development),
            "staging" => Ok(Self::Staging),
            "testing" => Ok(Self::Testing),
            _ => Err(Violation::UnknownVariant {
                value: s.to_string(),
                expected: "production, development, staging or testing",
            }),
        }
    }
}

/// A stored, fully validated domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Domain {
    pub identifier: DomainName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<Environment>,
    pub hosts: Vec<Host>,
    /// Storage-assigned write counter; `0` until first persisted.
    #[serde(default)]
    pub revision: u32,
}

impl Domain {
    /// Create a builder for constructing a [`Domain`].
    #[must_use]
    pub fn builder() -> DomainBuilder {
        DomainBuilder::default()
    }

    /// Merge `patch` into this record. `hosts` is replaced wholesale.
    #[must_use]
    pub fn apply(mut self, patch: PartialDomain) -> Self {
        if let Some(identifier) = patch.identifier {
            self.identifier = identifier;
        }
        if let Some(environment) = patch.environment {
            self.environment = environment;
        }
        if let Some(hosts) = patch.hosts {
            self.hosts = hosts;
        }
        self
    }
}

/// Untrusted domain payload used for creation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainCandidate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hosts: Option<Vec<HostCandidate>>,
}

impl From<Domain> for DomainCandidate {
    fn from(domain: Domain) -> Self {
        Self {
            identifier: Some(domain.identifier.into()),
            environment: domain.environment.map(|env| env.as_str().to_string()),
            hosts: Some(domain.hosts.into_iter().map(HostCandidate::from).collect()),
        }
    }
}

/// Untrusted payload for partial updates.
///
/// `environment` distinguishes an absent field (keep the stored value) from
/// an explicit `null` (clear it).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialDomainCandidate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub environment: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hosts: Option<Vec<HostCandidate>>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Validated partial update. `None` fields leave the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialDomain {
    pub identifier: Option<DomainName>,
    pub environment: Option<Option<Environment>>,
    pub hosts: Option<Vec<Host>>,
}

impl From<Domain> for PartialDomain {
    fn from(domain: Domain) -> Self {
        Self {
            identifier: Some(domain.identifier),
            environment: Some(domain.environment),
            hosts: Some(domain.hosts),
        }
    }
}

/// Validate a full domain candidate.
///
/// # Errors
///
/// Returns every failure found: `identifier`, `environment`, `hosts`, and
/// `hosts.<index>.<field>` for each invalid host, including duplicate path
/// prefixes within the domain.
pub fn validate_domain(candidate: &DomainCandidate) -> Result<Domain, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let identifier = errors.capture(
        "identifier",
        candidate
            .identifier
            .as_deref()
            .ok_or(Violation::Required)
            .and_then(DomainName::parse),
    );
    let environment = errors.capture(
        "environment",
        parse_environment(candidate.environment.as_deref()),
    );
    let hosts = match candidate.hosts.as_deref() {
        Some(hosts) => validate_hosts(hosts, &mut errors),
        None => {
            errors.push("hosts", Violation::Required);
            None
        }
    };

    errors.finish(|| {
        Some(Domain {
            identifier: identifier?,
            environment: environment?,
            hosts: hosts?,
            revision: 0,
        })
    })
}

/// Validate a partial domain candidate: present fields follow the same rules
/// as [`validate_domain`].
///
/// # Errors
///
/// Returns every failure found among the fields present in `candidate`.
pub fn validate_partial_domain(
    candidate: &PartialDomainCandidate,
) -> Result<PartialDomain, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let identifier = match candidate.identifier.as_deref() {
        Some(raw) => errors
            .capture("identifier", DomainName::parse(raw))
            .map(Some),
        None => Some(None),
    };
    let environment = match &candidate.environment {
        Some(raw) => errors
            .capture("environment", parse_environment(raw.as_deref()))
            .map(Some),
        None => Some(None),
    };
    let hosts = match candidate.hosts.as_deref() {
        Some(hosts) => validate_hosts(hosts, &mut errors).map(Some),
        None => Some(None),
    };

    errors.finish(|| {
        Some(PartialDomain {
            identifier: identifier?,
            environment: environment?,
            hosts: hosts?,
        })
    })
}

fn parse_environment(raw: Option<&str>) -> Result<Option<Environment>, Violation> {
    raw.map(str::parse).transpose()
}

fn validate_hosts(
    candidates: &[HostCandidate],
    errors: &mut ValidationErrors,
) -> Option<Vec<Host>> {
    if candidates.is_empty() {
        errors.push("hosts", Violation::NoHosts);
        return None;
    }

    let mut hosts = Vec::with_capacity(candidates.len());
    let mut failed = false;
    let mut seen: HashMap<&str, usize> = HashMap::new();

    for (idx, candidate) in candidates.iter().enumerate() {
        let mut host_errors = match validate_host(candidate) {
            Ok(host) => {
                hosts.push(host);
                ValidationErrors::new()
            }
            Err(host_errors) => host_errors,
        };

        if let Some(prefix) = candidate
            .path_prefix
            .as_deref()
            .filter(|prefix| prefix.starts_with('/'))
        {
            if let Some(first) = seen.get(prefix) {
                host_errors.push("pathPrefix", Violation::DuplicatePathPrefix(*first));
            } else {
                seen.insert(prefix, idx);
            }
        }

        if !host_errors.is_empty() {
            failed = true;
            errors.nest(&format!("hosts.{idx}"), host_errors);
        }
    }

    (!failed).then_some(hosts)
}

/// Step-by-step builder for [`Domain`].
#[derive(Debug, Default)]
pub struct DomainBuilder {
    identifier: Option<String>,
    environment: Option<Environment>,
    hosts: Vec<HostCandidate>,
}

impl DomainBuilder {
    #[must_use]
    pub fn identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    #[must_use]
    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = Some(environment);
        self
    }

    #[must_use]
    pub fn host(mut self, host: Host) -> Self {
        self.hosts.push(host.into());
        self
    }

    /// Consume the builder, validate, and return a [`Domain`].
    ///
    /// # Errors
    ///
    /// Returns [`HostmapError::Validation`] if the identifier is missing or
    /// malformed, or no host was added.
    pub fn build(self) -> Result<Domain, HostmapError> {
        let candidate = DomainCandidate {
            identifier: self.identifier,
            environment: self.environment.map(|env| env.as_str().to_string()),
            hosts: Some(self.hosts),
        };
        Ok(validate_domain(&candidate)?)
    }
}
