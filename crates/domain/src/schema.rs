//! Schema versions for domain payloads.
//!
//! Stored and exported payloads have gone through three incompatible shapes.
//! Each older shape is its own type with an explicit `upgrade` into the
//! current [`DomainCandidate`]; nothing is guessed from optional fields.
//!
//! | version          | key                          | host fields                 |
//! |------------------|------------------------------|-----------------------------|
//! | `v1`             | surrogate `id` + `domain`    | `type`, `host`, `path`      |
//! | `v2` (current)   | `identifier`, `environment`  | `type`, `address`, `pathPrefix` |
//! | `v3-named-port`  | `identifier`                 | `name`, `port`, `prefix`    |

use serde::{Deserialize, Serialize};

use crate::domain::{Domain, DomainCandidate, validate_domain};
use crate::host::HostCandidate;
use crate::validation::{ValidationErrors, Violation};

/// Upstream host assumed by the named-port revision.
pub const NAMED_PORT_UPSTREAM_HOST: &str = "localhost";

/// Known payload revisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchemaVersion {
    #[serde(rename = "v1")]
    V1,
    #[serde(rename = "v2")]
    V2,
    #[serde(rename = "v3-named-port")]
    NamedPort,
}

impl SchemaVersion {
    /// Translate a field path of the current schema into the field name the
    /// caller used in this revision, so errors point at what was sent.
    #[must_use]
    pub fn field_path(self, path: &str) -> String {
        let renamed = match (self, path.split('.').collect::<Vec<_>>().as_slice()) {
            (Self::V1, ["identifier"]) => Some("domain".to_string()),
            (Self::V1, ["hosts", idx, "address"]) => Some(format!("hosts.{idx}.host")),
            (Self::V1, ["hosts", idx, "pathPrefix"]) => Some(format!("hosts.{idx}.path")),
            (Self::NamedPort, ["hosts", idx, "address"]) => Some(format!("hosts.{idx}.port")),
            (Self::NamedPort, ["hosts", idx, "pathPrefix"]) => {
                Some(format!("hosts.{idx}.prefix"))
            }
            _ => None,
        };
        renamed.unwrap_or_else(|| path.to_string())
    }
}

/// A domain payload tagged with the schema revision it was written against.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "schemaVersion")]
pub enum VersionedDomain {
    #[serde(rename = "v1")]
    V1(V1Domain),
    #[serde(rename = "v2")]
    V2(DomainCandidate),
    #[serde(rename = "v3-named-port")]
    NamedPort(NamedPortDomain),
}

impl VersionedDomain {
    #[must_use]
    pub fn version(&self) -> SchemaVersion {
        match self {
            Self::V1(_) => SchemaVersion::V1,
            Self::V2(_) => SchemaVersion::V2,
            Self::NamedPort(_) => SchemaVersion::NamedPort,
        }
    }

    /// Upgrade to the current revision and validate it in one pass.
    ///
    /// # Errors
    ///
    /// Returns every offending field, both those with no representation in
    /// the current schema (a named port outside `1..=65535`) and those
    /// [`validate_domain`] rejects, under the field names of this revision.
    pub fn validate(self) -> Result<Domain, ValidationErrors> {
        let version = self.version();
        let (candidate, mut errors) = match self {
            Self::V1(domain) => (domain.upgrade(), ValidationErrors::new()),
            Self::V2(candidate) => (candidate, ValidationErrors::new()),
            Self::NamedPort(domain) => domain.upgrade(),
        };

        match validate_domain(&candidate) {
            Ok(domain) => errors.finish(|| Some(domain)),
            Err(found) => {
                // An upgrade error already describes the field the
                // converted value came from.
                for err in found {
                    let path = version.field_path(&err.path);
                    if !errors.contains(&path) {
                        errors.push(path, err.violation);
                    }
                }
                Err(errors)
            }
        }
    }
}

/// First revision: numeric surrogate key, `domain`/`host`/`path` naming.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct V1Domain {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub hosts: Option<Vec<V1Host>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct V1Host {
    #[serde(rename = "type", default)]
    pub host_type: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
}

impl V1Domain {
    /// The surrogate `id` is dropped: `identifier` is the key from `v2` on.
    fn upgrade(self) -> DomainCandidate {
        DomainCandidate {
            identifier: self.domain,
            environment: None,
            hosts: self.hosts.map(|hosts| {
                hosts
                    .into_iter()
                    .map(|host| HostCandidate {
                        host_type: host.host_type,
                        address: host.host,
                        path_prefix: host.path,
                        name: None,
                    })
                    .collect()
            }),
        }
    }
}

/// Named-port revision: hosts are local ports with a label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NamedPortDomain {
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub hosts: Option<Vec<NamedPortHost>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NamedPortHost {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub port: Option<i64>,
    #[serde(default)]
    pub prefix: Option<String>,
}

impl NamedPortDomain {
    /// Ports become `http://localhost:<port>` addresses; names become labels.
    /// Missing or out-of-range ports are reported as `hosts.<index>.port`
    /// and leave the address unset.
    fn upgrade(self) -> (DomainCandidate, ValidationErrors) {
        let mut errors = ValidationErrors::new();

        let hosts = self.hosts.map(|hosts| {
            hosts
                .into_iter()
                .enumerate()
                .map(|(idx, host)| {
                    let address = errors
                        .capture(format!("hosts.{idx}.port"), check_port(host.port))
                        .map(|port| format!("http://{NAMED_PORT_UPSTREAM_HOST}:{port}"));
                    HostCandidate {
                        host_type: None,
                        address,
                        path_prefix: host.prefix,
                        name: host.name,
                    }
                })
                .collect()
        });

        let candidate = DomainCandidate {
            identifier: self.identifier,
            environment: None,
            hosts,
        };
        (candidate, errors)
    }
}

fn check_port(port: Option<i64>) -> Result<u16, Violation> {
    let port = port.ok_or(Violation::Required)?;
    u16::try_from(port)
        .ok()
        .filter(|port| *port != 0)
        .ok_or(Violation::PortOutOfRange)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Environment;
    use crate::host::HostType;
    use serde_json::json;

    fn versioned(value: serde_json::Value) -> VersionedDomain {
        serde_json::from_value(value).unwrap()
    }

    fn paths(errors: &ValidationErrors) -> Vec<&str> {
        errors.iter().map(|err| err.path.as_str()).collect()
    }

    #[test]
    fn should_upgrade_v1_payload_and_drop_surrogate_id() {
        let payload = versioned(json!({
            "schemaVersion": "v1",
            "id": 42,
            "domain": "app.example.com",
            "hosts": [{ "type": "websocket", "host": "http://localhost:8081", "path": "/" }]
        }));
        assert_eq!(payload.version(), SchemaVersion::V1);

        let domain = payload.validate().unwrap();
        assert_eq!(domain.identifier.as_str(), "app.example.com");
        assert_eq!(domain.hosts[0].host_type, HostType::Websocket);
        assert_eq!(domain.hosts[0].address, "http://localhost:8081");
        assert_eq!(domain.hosts[0].path_prefix, "/");
    }

    #[test]
    fn should_report_v1_errors_under_v1_field_names() {
        let payload = versioned(json!({
            "schemaVersion": "v1",
            "domain": "",
            "hosts": [{ "host": "localhost", "path": "api" }]
        }));

        let errors = payload.validate().unwrap_err();
        assert_eq!(paths(&errors), ["domain", "hosts.0.host", "hosts.0.path"]);
    }

    #[test]
    fn should_pass_current_payload_through_unchanged() {
        let payload = versioned(json!({
            "schemaVersion": "v2",
            "identifier": "api.example.com",
            "environment": "production",
            "hosts": [{ "address": "http://localhost:4000", "pathPrefix": "/" }]
        }));
        assert_eq!(payload.version(), SchemaVersion::V2);

        let domain = payload.validate().unwrap();
        assert_eq!(domain.environment, Some(Environment::Production));
    }

    #[test]
    fn should_upgrade_named_port_hosts_to_local_addresses() {
        let payload = versioned(json!({
            "schemaVersion": "v3-named-port",
            "identifier": "admin.example.com",
            "hosts": [
                { "name": "frontend", "port": 3000, "prefix": "/" },
                { "name": "backend", "port": 5001, "prefix": "/api" }
            ]
        }));

        let domain = payload.validate().unwrap();
        assert_eq!(domain.hosts[0].address, "http://localhost:3000");
        assert_eq!(domain.hosts[0].name.as_deref(), Some("frontend"));
        assert_eq!(domain.hosts[1].address, "http://localhost:5001");
        assert_eq!(domain.hosts[1].path_prefix, "/api");
    }

    #[test]
    fn should_reject_named_port_outside_range() {
        let payload = versioned(json!({
            "schemaVersion": "v3-named-port",
            "identifier": "admin.example.com",
            "hosts": [
                { "name": "zero", "port": 0, "prefix": "/" },
                { "name": "big", "port": 70000, "prefix": "/a" },
                { "name": "none", "prefix": "/b" }
            ]
        }));

        let errors = payload.validate().unwrap_err();
        assert_eq!(errors.len(), 3);
        assert_eq!(errors.get("hosts.0.port"), Some(&Violation::PortOutOfRange));
        assert_eq!(errors.get("hosts.1.port"), Some(&Violation::PortOutOfRange));
        assert_eq!(errors.get("hosts.2.port"), Some(&Violation::Required));
    }

    #[test]
    fn should_report_port_and_other_named_port_errors_together() {
        let payload = versioned(json!({
            "schemaVersion": "v3-named-port",
            "identifier": "",
            "hosts": [{ "name": "web", "port": 0, "prefix": "nope" }]
        }));

        let errors = payload.validate().unwrap_err();
        assert_eq!(
            paths(&errors),
            ["hosts.0.port", "identifier", "hosts.0.prefix"]
        );
        assert_eq!(errors.get("hosts.0.port"), Some(&Violation::PortOutOfRange));
        assert_eq!(
            errors.get("hosts.0.prefix"),
            Some(&Violation::MissingLeadingSlash)
        );
    }

    #[test]
    fn should_keep_current_field_paths_for_v2() {
        assert_eq!(
            SchemaVersion::V2.field_path("hosts.3.pathPrefix"),
            "hosts.3.pathPrefix"
        );
        assert_eq!(
            SchemaVersion::NamedPort.field_path("hosts.3.pathPrefix"),
            "hosts.3.prefix"
        );
        assert_eq!(SchemaVersion::V1.field_path("hosts"), "hosts");
    }

    #[test]
    fn should_reject_unknown_schema_version() {
        let result: Result<VersionedDomain, _> = serde_json::from_value(json!({
            "schemaVersion": "v9",
            "identifier": "api.example.com"
        }));
        assert!(result.is_err());
    }
}
