//! Routing table — the validated snapshot a downstream reverse proxy consumes.
//!
//! Built from registry contents; no request dispatch happens here.

use std::cmp::Reverse;
use std::fmt;

use serde::Serialize;

use crate::domain::{Domain, DomainName, Environment};
use crate::host::{HostType, reject_directive_breakers};
use crate::time::{self, Timestamp};
use crate::validation::{ValidationErrors, Violation};

/// One path-prefix route inside a virtual host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub path_prefix: String,
    #[serde(rename = "type")]
    pub host_type: HostType,
    pub upstream: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// All routes served under one domain name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualHost {
    pub server_name: DomainName,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<Environment>,
    pub revision: u32,
    /// Longest prefix first; equal lengths keep their configured order.
    pub routes: Vec<Route>,
}

impl From<Domain> for VirtualHost {
    fn from(domain: Domain) -> Self {
        let mut routes: Vec<Route> = domain
            .hosts
            .into_iter()
            .map(|host| Route {
                path_prefix: host.path_prefix,
                host_type: host.host_type,
                upstream: host.address,
                name: host.name,
            })
            .collect();
        routes.sort_by_key(|route| Reverse(route.path_prefix.len()));

        Self {
            server_name: domain.identifier,
            environment: domain.environment,
            revision: domain.revision,
            routes,
        }
    }
}

/// Snapshot of every domain, in registry order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingTable {
    pub generated_at: Timestamp,
    pub virtual_hosts: Vec<VirtualHost>,
}

impl RoutingTable {
    /// Build a table stamped with the current time.
    pub fn build(domains: impl IntoIterator<Item = Domain>) -> Self {
        Self::build_at(domains, time::now())
    }

    pub fn build_at(domains: impl IntoIterator<Item = Domain>, generated_at: Timestamp) -> Self {
        Self {
            generated_at,
            virtual_hosts: domains.into_iter().map(VirtualHost::from).collect(),
        }
    }

    /// Render the table as nginx `server` blocks.
    #[must_use]
    pub fn to_nginx_conf(&self, options: &NginxOptions) -> String {
        NginxConf {
            table: self,
            options,
        }
        .to_string()
    }
}

/// Deployment settings for the rendered nginx configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NginxOptions {
    /// Terminate TLS on 443 and redirect port 80 there. Certificates are
    /// expected where certbot writes them under `cert_dir`.
    pub tls: bool,
    /// Certbot configuration root, holding `live/<name>/fullchain.pem`.
    pub cert_dir: String,
    /// Value of `client_max_body_size` (`512M`, `10k`, `1024`).
    pub client_max_body_size: String,
}

impl Default for NginxOptions {
    fn default() -> Self {
        Self {
            tls: true,
            cert_dir: "/etc/letsencrypt".to_string(),
            client_max_body_size: "512M".to_string(),
        }
    }
}

impl NginxOptions {
    /// Check that every setting can be written into the configuration as is.
    ///
    /// # Errors
    ///
    /// Returns a `cert_dir` error for a relative path or one containing
    /// directive metacharacters, and a `client_max_body_size` error for
    /// anything but digits with an optional `k`/`m`/`g` unit.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.capture("cert_dir", check_cert_dir(&self.cert_dir));
        errors.capture(
            "client_max_body_size",
            check_body_size(&self.client_max_body_size),
        );
        errors.finish(|| Some(()))
    }

    fn cert_dir(&self) -> &str {
        self.cert_dir.trim_end_matches('/')
    }
}

fn check_cert_dir(raw: &str) -> Result<(), Violation> {
    if raw.is_empty() {
        return Err(Violation::Empty);
    }
    if !raw.starts_with('/') {
        return Err(Violation::MissingLeadingSlash);
    }
    reject_directive_breakers(raw)
}

fn check_body_size(raw: &str) -> Result<(), Violation> {
    let digits = raw.strip_suffix(['k', 'K', 'm', 'M', 'g', 'G']).unwrap_or(raw);
    if digits.is_empty() {
        return Err(Violation::Empty);
    }
    match raw.chars().find(|c| !c.is_ascii_alphanumeric()) {
        Some(c) => Err(Violation::ForbiddenCharacter(c)),
        None if digits.chars().all(|c| c.is_ascii_digit()) => Ok(()),
        None => Err(Violation::UnknownVariant {
            value: raw.to_string(),
            expected: "a size such as 512M, 10k or 1024",
        }),
    }
}

struct NginxConf<'a> {
    table: &'a RoutingTable,
    options: &'a NginxOptions,
}

impl NginxConf<'_> {
    fn write_virtual_host(&self, f: &mut fmt::Formatter<'_>, vhost: &VirtualHost) -> fmt::Result {
        let name = vhost.server_name.as_str();
        // `www.` cannot be prefixed to a wildcard name.
        let wildcard = name.strip_prefix("*.");
        let server_names = match wildcard {
            Some(_) => name.to_string(),
            None => format!("{name} www.{name}"),
        };
        let canonical = match wildcard {
            Some(_) => "$host",
            None => name,
        };

        writeln!(f)?;
        writeln!(f, "# {name} (revision {})", vhost.revision)?;
        let scheme = if self.options.tls {
            writeln!(f, "server {{")?;
            writeln!(f, "    listen 80;")?;
            writeln!(f, "    listen [::]:80;")?;
            writeln!(f, "    server_name {server_names};")?;
            writeln!(f, "    return 301 https://{canonical}$request_uri;")?;
            writeln!(f, "}}")?;
            writeln!(f)?;
            writeln!(f, "server {{")?;
            writeln!(f, "    listen 443 ssl http2;")?;
            writeln!(f, "    listen [::]:443 ssl http2;")?;
            "https"
        } else {
            writeln!(f, "server {{")?;
            writeln!(f, "    listen 80;")?;
            writeln!(f, "    listen [::]:80;")?;
            "http"
        };
        writeln!(f, "    server_name {server_names};")?;
        if wildcard.is_none() {
            writeln!(f)?;
            writeln!(f, "    if ($host = www.{name}) {{")?;
            writeln!(f, "        return 301 {scheme}://{name}$request_uri;")?;
            writeln!(f, "    }}")?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "    client_max_body_size {};",
            self.options.client_max_body_size
        )?;
        if self.options.tls {
            let cert_dir = self.options.cert_dir();
            let cert_name = wildcard.unwrap_or(name);
            writeln!(f)?;
            writeln!(
                f,
                "    ssl_certificate {cert_dir}/live/{cert_name}/fullchain.pem;"
            )?;
            writeln!(
                f,
                "    ssl_certificate_key {cert_dir}/live/{cert_name}/privkey.pem;"
            )?;
            writeln!(f, "    include {cert_dir}/options-ssl-nginx.conf;")?;
            writeln!(f, "    ssl_dhparam {cert_dir}/ssl-dhparams.pem;")?;
        }
        for route in &vhost.routes {
            write_location(f, route)?;
        }
        writeln!(f, "}}")
    }
}

fn write_location(f: &mut fmt::Formatter<'_>, route: &Route) -> fmt::Result {
    writeln!(f)?;
    writeln!(f, "    location {} {{", route.path_prefix)?;
    writeln!(f, "        proxy_pass {};", route.upstream)?;
    if route.host_type == HostType::Websocket {
        writeln!(f, "        proxy_http_version 1.1;")?;
        writeln!(f, "        proxy_set_header Upgrade $http_upgrade;")?;
        writeln!(f, "        proxy_set_header Connection \"Upgrade\";")?;
    }
    writeln!(f, "        proxy_set_header Host $host;")?;
    writeln!(f, "        proxy_set_header X-Real-IP $remote_addr;")?;
    writeln!(
        f,
        "        proxy_set_header X-Forwarded-For $proxy_add_x_forwarded_for;"
    )?;
    writeln!(f, "        proxy_set_header X-Forwarded-Proto $scheme;")?;
    writeln!(f, "    }}")
}

impl fmt::Display for NginxConf<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "# generated by hostmap at {}",
            self.table.generated_at.to_rfc3339()
        )?;
        for vhost in &self.table.virtual_hosts {
            self.write_virtual_host(f, vhost)?;
        }
        Ok(())
    }
}
