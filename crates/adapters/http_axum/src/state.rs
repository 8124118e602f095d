//! Shared application state for axum handlers.

use std::sync::Arc;

use hostmap_app::ports::DomainRepository;
use hostmap_app::services::domain_registry::DomainRegistry;
use hostmap_domain::routing_table::NginxOptions;

/// Application state shared across all axum handlers.
///
/// Generic over the repository type to avoid dynamic dispatch.
/// `Clone` is implemented manually so the repository itself does not
/// need to be `Clone` — only the `Arc` wrappers are cloned.
pub struct AppState<DR> {
    /// Domain registry service.
    pub registry: Arc<DomainRegistry<DR>>,
    /// Bearer token required on mutating routes; `None` disables the check.
    pub api_token: Option<Arc<str>>,
    /// Settings for the rendered nginx configuration.
    pub nginx: Arc<NginxOptions>,
}

impl<DR> Clone for AppState<DR> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            api_token: self.api_token.clone(),
            nginx: Arc::clone(&self.nginx),
        }
    }
}

impl<DR> AppState<DR>
where
    DR: DomainRepository + Send + Sync + 'static,
{
    /// Create a new application state from a registry instance.
    pub fn new(registry: DomainRegistry<DR>) -> Self {
        Self {
            registry: Arc::new(registry),
            api_token: None,
            nginx: Arc::new(NginxOptions::default()),
        }
    }

    /// Require `Authorization: Bearer <token>` on mutating routes.
    #[must_use]
    pub fn with_api_token(mut self, token: impl Into<Arc<str>>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// Replace the default nginx rendering settings.
    #[must_use]
    pub fn with_nginx_options(mut self, options: NginxOptions) -> Self {
        self.nginx = Arc::new(options);
        self
    }
}
