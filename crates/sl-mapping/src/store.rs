//! Mapping storage contract

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{DomainStats, Mapping, MappingError, NewMapping, ResourceRef, Result, ShortCode};

/// Persistent keyspace for one resource domain.
///
/// Implementations must enforce code uniqueness inside `insert` itself and
/// perform `increment_usage` as one atomic storage operation; callers never
/// read-modify-write a counter.
#[async_trait]
pub trait MappingStore<R: ResourceRef>: Send + Sync {
    async fn exists(&self, code: &ShortCode) -> Result<bool>;

    /// Insert a new mapping. Fails with [`MappingError::DuplicateCode`] when
    /// the code is already bound.
    async fn insert(&self, mapping: NewMapping<R>) -> Result<Mapping<R>>;

    async fn find(&self, code: &ShortCode) -> Result<Option<Mapping<R>>>;

    /// Like [`find`](Self::find) but absence is [`MappingError::NotFound`].
    async fn get(&self, code: &ShortCode) -> Result<Mapping<R>> {
        self.find(code)
            .await?
            .ok_or_else(|| MappingError::NotFound(code.to_string()))
    }

    /// Atomically add one to the usage counter. Returns the new value, or
    /// `None` if the code is not bound.
    async fn increment_usage(&self, code: &ShortCode) -> Result<Option<i64>>;

    /// Mappings created by `owner`, oldest first.
    async fn find_by_owner(&self, owner: &str) -> Result<Vec<Mapping<R>>>;

    /// Every mapping in the domain, oldest first.
    async fn list_all(&self) -> Result<Vec<Mapping<R>>>;

    /// Append a failed-lookup event.
    async fn record_lookup_failure(&self, at: DateTime<Utc>) -> Result<()>;

    async fn stats(&self) -> Result<DomainStats>;
}
