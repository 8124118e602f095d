//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `hostmap.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values; a variable that is set but cannot be parsed
//! is an error rather than silently ignored.

use std::str::FromStr;

use hostmap_domain::routing_table::NginxOptions;
use hostmap_domain::validation::ValidationErrors;
use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Database settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Rendered nginx configuration settings.
    pub nginx: NginxConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
    /// Bearer token required on mutating API routes. Unset disables the check.
    pub api_token: Option<String>,
}

/// `SQLite` database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL or file path.
    pub url: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// How `/api/routing-table/nginx` renders server blocks.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct NginxConfig {
    /// Serve on 443 with certbot certificates and redirect 80 there.
    pub tls: bool,
    /// Certbot configuration root.
    pub cert_dir: String,
    /// `client_max_body_size` for every server block.
    pub client_max_body_size: String,
}

impl Config {
    /// Load configuration from `hostmap.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, an
    /// override cannot be parsed, or the resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("hostmap.toml")?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(val) = lookup("HOSTMAP_HOST") {
            self.server.host = val;
        }
        if let Some(port) = parse_var(&lookup, "HOSTMAP_PORT")? {
            self.server.port = port;
        }
        if let Some(val) = lookup("HOSTMAP_BIND") {
            let (host, port) = val
                .rsplit_once(':')
                .and_then(|(host, port)| Some((host, port.parse().ok()?)))
                .ok_or_else(|| ConfigError::InvalidVar {
                    var: "HOSTMAP_BIND",
                    value: val.clone(),
                })?;
            self.server.host = host.to_string();
            self.server.port = port;
        }
        if let Some(val) = lookup("HOSTMAP_API_TOKEN") {
            self.server.api_token = Some(val);
        }
        if let Some(val) = lookup("HOSTMAP_DATABASE_URL") {
            self.database.url = val;
        }
        if let Some(val) = lookup("HOSTMAP_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = lookup("RUST_LOG") {
            self.logging.filter = val;
        }
        if let Some(tls) = parse_var(&lookup, "HOSTMAP_NGINX_TLS")? {
            self.nginx.tls = tls;
        }
        if let Some(val) = lookup("HOSTMAP_NGINX_CERT_DIR") {
            self.nginx.cert_dir = val;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero"));
        }
        if self
            .server
            .api_token
            .as_deref()
            .is_some_and(|token| token.trim().is_empty())
        {
            return Err(ConfigError::Validation("api_token must not be empty"));
        }
        self.nginx_options().validate()?;
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Return the database URL in `sqlx`-compatible format.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database.url
    }

    /// Rendering settings handed to the HTTP adapter.
    #[must_use]
    pub fn nginx_options(&self) -> NginxOptions {
        NginxOptions {
            tls: self.nginx.tls,
            cert_dir: self.nginx.cert_dir.clone(),
            client_max_body_size: self.nginx.client_max_body_size.clone(),
        }
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError> {
    lookup(var)
        .map(|value| {
            value
                .parse()
                .map_err(|_| ConfigError::InvalidVar { var, value })
        })
        .transpose()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8001,
            api_token: None,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:hostmap.db?mode=rwc".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "hostmapd=info,hostmap=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for NginxConfig {
    fn default() -> Self {
        let options = NginxOptions::default();
        Self {
            tls: options.tls,
            cert_dir: options.cert_dir,
            client_max_body_size: options.client_max_body_size,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// An environment override is set to an unusable value.
    #[error("invalid value `{value}` for {var}")]
    InvalidVar { var: &'static str, value: String },
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(&'static str),
    /// The nginx settings cannot be rendered safely.
    #[error("invalid [nginx] configuration")]
    Nginx(#[from] ValidationErrors),
}
