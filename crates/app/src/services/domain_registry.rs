//! Domain registry — the authoritative CRUD use-cases over domain records.
//!
//! Every mutation validates first, then goes through a single atomic call on
//! the persistence handle; a rejected call leaves the registry untouched.

use hostmap_domain::domain::{
    Domain, DomainCandidate, DomainName, PartialDomain, PartialDomainCandidate, validate_domain,
    validate_partial_domain,
};
use hostmap_domain::error::{HostmapError, NotFoundError};
use hostmap_domain::routing_table::RoutingTable;
use hostmap_domain::schema::VersionedDomain;

use crate::ports::DomainRepository;

/// Application service owning the domain collection.
pub struct DomainRegistry<R> {
    repo: R,
}

impl<R: DomainRepository> DomainRegistry<R> {
    /// Create a new registry backed by the given persistence handle.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Validate `candidate` and store it as a new domain.
    ///
    /// # Errors
    ///
    /// Returns [`HostmapError::Validation`] if invariants fail,
    /// [`HostmapError::Conflict`] if the identifier is taken (compared
    /// case-insensitively), or a storage error from the repository.
    #[tracing::instrument(skip_all, fields(identifier = candidate.identifier.as_deref()))]
    pub async fn create(&self, candidate: &DomainCandidate) -> Result<Domain, HostmapError> {
        let domain = validate_domain(candidate)?;
        self.repo.insert(domain).await
    }

    /// List all domains in insertion order.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list(&self) -> Result<Vec<Domain>, HostmapError> {
        self.repo.get_all().await
    }

    /// Look up a domain by identifier, returning an error if not found.
    ///
    /// # Errors
    ///
    /// Returns [`HostmapError::NotFound`] when no domain matches `key`,
    /// or a storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, key: &str) -> Result<Domain, HostmapError> {
        let identifier = lookup_key(key)?;
        self.repo
            .get(&identifier)
            .await?
            .ok_or_else(|| NotFoundError::domain(identifier).into())
    }

    /// Merge a partial candidate into the stored domain.
    ///
    /// Present fields replace stored ones; `hosts` is replaced wholesale.
    ///
    /// # Errors
    ///
    /// Returns [`HostmapError::Validation`] if a present field is invalid,
    /// [`HostmapError::NotFound`] if `key` is absent,
    /// [`HostmapError::Conflict`] if a renamed identifier is taken or the
    /// record changed concurrently, or a storage error from the repository.
    #[tracing::instrument(skip(self, candidate))]
    pub async fn update(
        &self,
        key: &str,
        candidate: &PartialDomainCandidate,
    ) -> Result<Domain, HostmapError> {
        let patch = validate_partial_domain(candidate)?;
        self.apply(key, patch).await
    }

    /// Replace every field of the stored domain with a full candidate.
    ///
    /// # Errors
    ///
    /// Same as [`DomainRegistry::update`], with full validation rules.
    #[tracing::instrument(skip(self, candidate))]
    pub async fn replace(
        &self,
        key: &str,
        candidate: &DomainCandidate,
    ) -> Result<Domain, HostmapError> {
        let domain = validate_domain(candidate)?;
        self.apply(key, PartialDomain::from(domain)).await
    }

    /// Delete a domain by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`HostmapError::NotFound`] when no domain matches `key`
    /// (including a repeated delete), or a storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, key: &str) -> Result<(), HostmapError> {
        let identifier = lookup_key(key)?;
        self.repo.delete(&identifier).await
    }

    /// Upgrade a payload written against any known schema version, then store it.
    ///
    /// # Errors
    ///
    /// Same as [`DomainRegistry::create`]; validation errors are reported
    /// under the field names of the payload's revision.
    #[tracing::instrument(skip_all, fields(schema_version = ?payload.version()))]
    pub async fn import(&self, payload: VersionedDomain) -> Result<Domain, HostmapError> {
        let domain = payload.validate()?;
        self.repo.insert(domain).await
    }

    /// Build the routing table from the current registry contents.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn routing_table(&self) -> Result<RoutingTable, HostmapError> {
        Ok(RoutingTable::build(self.repo.get_all().await?))
    }

    async fn apply(&self, key: &str, patch: PartialDomain) -> Result<Domain, HostmapError> {
        let identifier = lookup_key(key)?;
        let current = self
            .repo
            .get(&identifier)
            .await?
            .ok_or_else(|| NotFoundError::domain(identifier.as_str()))?;

        let revision = current.revision;
        let next = current.apply(patch);
        self.repo
            .compare_and_swap(&identifier, revision, next)
            .await
    }
}

/// A key that is not a valid name cannot match any stored record.
fn lookup_key(key: &str) -> Result<DomainName, NotFoundError> {
    DomainName::parse(key).map_err(|_| NotFoundError::domain(DomainName::canonical(key)))
}
