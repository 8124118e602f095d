//! `SQLite` implementation of [`DomainRepository`].
//!
//! The unique index on `identifier` makes insert-if-absent atomic, and a
//! single conditional `UPDATE ... WHERE revision = ?` provides the
//! compare-and-swap; no read-then-write races are left to the caller.

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use hostmap_app::ports::DomainRepository;
use hostmap_domain::domain::{Domain, DomainName, Environment};
use hostmap_domain::error::{ConflictError, HostmapError, NotFoundError};
use hostmap_domain::host::Host;

use crate::error::StorageError;

/// Wrapper for converting database rows into domain [`Domain`].
struct Wrapper(Domain);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<Domain> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let identifier: String = row.try_get("identifier")?;
        let environment: Option<String> = row.try_get("environment")?;
        let hosts_json: String = row.try_get("hosts")?;
        let revision: i64 = row.try_get("revision")?;

        let identifier =
            DomainName::parse(&identifier).map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        let environment = environment
            .map(|s| s.parse::<Environment>())
            .transpose()
            .map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        let hosts: Vec<Host> = serde_json::from_str(&hosts_json)
            .map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        let revision =
            u32::try_from(revision).map_err(|err| sqlx::Error::Decode(Box::new(err)))?;

        Ok(Self(Domain {
            identifier,
            environment,
            hosts,
            revision,
        }))
    }
}

const INSERT: &str =
    "INSERT INTO domains (identifier, environment, hosts, revision) VALUES (?, ?, ?, 1)";
const SELECT_BY_IDENTIFIER: &str = "SELECT * FROM domains WHERE identifier = ?";
const SELECT_ALL: &str = "SELECT * FROM domains ORDER BY seq";
const COMPARE_AND_SWAP: &str = "UPDATE domains SET identifier = ?, environment = ?, hosts = ?, revision = ? WHERE identifier = ? AND revision = ?";
const DELETE_BY_IDENTIFIER: &str = "DELETE FROM domains WHERE identifier = ?";

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

/// `SQLite`-backed domain repository.
pub struct SqliteDomainRepository {
    pool: SqlitePool,
}

impl SqliteDomainRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl DomainRepository for SqliteDomainRepository {
    async fn get(&self, identifier: &DomainName) -> Result<Option<Domain>, HostmapError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_IDENTIFIER)
            .bind(identifier.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(Wrapper::maybe(row))
    }

    async fn get_all(&self) -> Result<Vec<Domain>, HostmapError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_ALL)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn insert(&self, mut domain: Domain) -> Result<Domain, HostmapError> {
        let hosts_json = serde_json::to_string(&domain.hosts).map_err(StorageError::from)?;

        let result = sqlx::query(INSERT)
            .bind(domain.identifier.as_str())
            .bind(domain.environment.map(Environment::as_str))
            .bind(&hosts_json)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => {
                domain.revision = 1;
                Ok(domain)
            }
            Err(err) if is_unique_violation(&err) => Err(ConflictError::IdentifierTaken {
                identifier: domain.identifier.to_string(),
            }
            .into()),
            Err(err) => Err(StorageError::from(err).into()),
        }
    }

    async fn compare_and_swap(
        &self,
        identifier: &DomainName,
        expected_revision: u32,
        mut next: Domain,
    ) -> Result<Domain, HostmapError> {
        let revision = expected_revision
            .checked_add(1)
            .ok_or(StorageError::RevisionExhausted)?;
        let hosts_json = serde_json::to_string(&next.hosts).map_err(StorageError::from)?;

        let result = sqlx::query(COMPARE_AND_SWAP)
            .bind(next.identifier.as_str())
            .bind(next.environment.map(Environment::as_str))
            .bind(&hosts_json)
            .bind(i64::from(revision))
            .bind(identifier.as_str())
            .bind(i64::from(expected_revision))
            .execute(&self.pool)
            .await;

        match result {
            Ok(done) if done.rows_affected() == 1 => {
                next.revision = revision;
                Ok(next)
            }
            Ok(_) => match self.get(identifier).await? {
                None => Err(NotFoundError::domain(identifier.as_str()).into()),
                Some(_) => Err(ConflictError::ConcurrentModification {
                    identifier: identifier.to_string(),
                }
                .into()),
            },
            Err(err) if is_unique_violation(&err) => Err(ConflictError::IdentifierTaken {
                identifier: next.identifier.to_string(),
            }
            .into()),
            Err(err) => Err(StorageError::from(err).into()),
        }
    }

    async fn delete(&self, identifier: &DomainName) -> Result<(), HostmapError> {
        let done = sqlx::query(DELETE_BY_IDENTIFIER)
            .bind(identifier.as_str())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        if done.rows_affected() == 0 {
            return Err(NotFoundError::domain(identifier.as_str()).into());
        }
        Ok(())
    }
}
