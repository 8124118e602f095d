//! Storage port — the persistence handle behind the domain registry.

use std::future::Future;

use hostmap_domain::domain::{Domain, DomainName};
use hostmap_domain::error::HostmapError;

/// Persistence handle for [`Domain`] records keyed by their identifier.
///
/// Implementations must make every method atomic: the existence or
/// uniqueness check and the write it guards are one step, so two concurrent
/// inserts of the same identifier cannot both succeed.
pub trait DomainRepository {
    /// Point lookup by identifier.
    fn get(
        &self,
        identifier: &DomainName,
    ) -> impl Future<Output = Result<Option<Domain>, HostmapError>> + Send;

    /// Full scan in insertion order.
    fn get_all(&self) -> impl Future<Output = Result<Vec<Domain>, HostmapError>> + Send;

    /// Insert if no record owns `domain.identifier`.
    ///
    /// The stored record is returned with `revision = 1`. Fails with
    /// [`HostmapError::Conflict`] when the identifier is taken.
    fn insert(&self, domain: Domain) -> impl Future<Output = Result<Domain, HostmapError>> + Send;

    /// Replace the record stored under `identifier` if its revision still
    /// equals `expected_revision`.
    ///
    /// `next.identifier` may differ from `identifier` (rename). The stored
    /// record is returned with `revision = expected_revision + 1`.
    /// Fails with [`HostmapError::NotFound`] when `identifier` is absent and
    /// [`HostmapError::Conflict`] when the revision moved on or the new
    /// identifier belongs to another record. A record already at
    /// `u32::MAX` cannot be written again and fails with
    /// [`HostmapError::Storage`].
    fn compare_and_swap(
        &self,
        identifier: &DomainName,
        expected_revision: u32,
        next: Domain,
    ) -> impl Future<Output = Result<Domain, HostmapError>> + Send;

    /// Delete if present. Fails with [`HostmapError::NotFound`] otherwise.
    fn delete(
        &self,
        identifier: &DomainName,
    ) -> impl Future<Output = Result<(), HostmapError>> + Send;
}
