//! Field-level validation errors.
//!
//! Validators never stop at the first problem: every offending field is
//! recorded as a [`FieldError`] under its dotted path (`hosts.1.address`)
//! and the whole set is returned as [`ValidationErrors`].

use std::fmt;

/// The rule a field broke.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Violation {
    #[error("is required")]
    Required,

    #[error("must not be empty")]
    Empty,

    #[error("must be a valid absolute URL ({0})")]
    InvalidUrl(url::ParseError),

    #[error("uses unsupported scheme `{0}`, expected http, https, ws or wss")]
    UnsupportedScheme(String),

    #[error("must include a host")]
    MissingHost,

    #[error("must start with `/`")]
    MissingLeadingSlash,

    #[error("must not contain `{}`", .0.escape_default())]
    ForbiddenCharacter(char),

    #[error("`{value}` is not one of {expected}")]
    UnknownVariant {
        value: String,
        expected: &'static str,
    },

    #[error("has the wrong type: {0}")]
    InvalidType(String),

    #[error("must be between 1 and 65535")]
    PortOutOfRange,

    #[error("must contain at least one host")]
    NoHosts,

    #[error("duplicates the path prefix of hosts.{0}")]
    DuplicatePathPrefix(usize),

    #[error("is not a valid domain name: {0}")]
    InvalidDomainName(&'static str),
}

/// One violated constraint, located by its dotted field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub path: String,
    pub violation: Violation,
}

impl FieldError {
    /// Human-readable reason for the failure.
    #[must_use]
    pub fn reason(&self) -> String {
        self.violation.to_string()
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.path, self.violation)
    }
}

/// Every field-level failure found while validating one candidate.
///
/// Only ever handed out non-empty: [`ValidationErrors::finish`] turns an
/// empty collector back into a success.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set holding a single failure.
    #[must_use]
    pub fn single(path: impl Into<String>, violation: Violation) -> Self {
        let mut errors = Self::new();
        errors.push(path, violation);
        errors
    }

    pub fn push(&mut self, path: impl Into<String>, violation: Violation) {
        self.errors.push(FieldError {
            path: path.into(),
            violation,
        });
    }

    /// Record the error of `result` under `path`, returning the value on success.
    pub fn capture<T>(
        &mut self,
        path: impl Into<String>,
        result: Result<T, Violation>,
    ) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(violation) => {
                self.push(path, violation);
                None
            }
        }
    }

    /// Absorb the errors of a nested value, prefixing each path with `prefix.`.
    pub fn nest(&mut self, prefix: &str, other: ValidationErrors) {
        self.errors
            .extend(other.errors.into_iter().map(|err| FieldError {
                path: format!("{prefix}.{}", err.path),
                violation: err.violation,
            }));
    }

    /// `Ok(value())` when nothing was recorded, otherwise every recorded error.
    ///
    /// # Errors
    ///
    /// Returns `self` when at least one field failed.
    pub fn finish<T>(self, value: impl FnOnce() -> Option<T>) -> Result<T, Self> {
        if !self.errors.is_empty() {
            return Err(self);
        }
        value().ok_or(self)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    /// Look up the failure recorded for `path`, if any.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&Violation> {
        self.errors
            .iter()
            .find(|err| err.path == path)
            .map(|err| &err.violation)
    }

    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("validation failed")?;
        for (idx, err) in self.errors.iter().enumerate() {
            let sep = if idx == 0 { ": " } else { "; " };
            write!(f, "{sep}{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl IntoIterator for ValidationErrors {
    type Item = FieldError;
    type IntoIter = std::vec::IntoIter<FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}
