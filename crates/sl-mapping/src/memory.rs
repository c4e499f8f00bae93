//! In-memory mapping store
//!
//! Used by tests and throwaway dev instances. Uniqueness comes from the
//! sharded map's entry API and increments happen under the shard lock, so the
//! same guarantees as the SQLite store hold within one process.

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;

use crate::{DomainStats, Mapping, MappingError, MappingStore, NewMapping, ResourceRef, Result, ShortCode};

pub struct InMemoryMappingStore<R> {
    mappings: DashMap<ShortCode, Mapping<R>>,
    next_id: AtomicI64,
    lookup_failures: Mutex<Vec<DateTime<Utc>>>,
}

impl<R: ResourceRef> InMemoryMappingStore<R> {
    pub fn new() -> Self {
        Self {
            mappings: DashMap::new(),
            next_id: AtomicI64::new(1),
            lookup_failures: Mutex::new(Vec::new()),
        }
    }

    /// Timestamps of recorded lookup failures.
    pub fn lookup_failures(&self) -> Vec<DateTime<Utc>> {
        self.lookup_failures.lock().clone()
    }

    fn sorted<I: Iterator<Item = Mapping<R>>>(iter: I) -> Vec<Mapping<R>> {
        let mut mappings: Vec<_> = iter.collect();
        mappings.sort_by_key(|m| m.id);
        mappings
    }
}

impl<R: ResourceRef> Default for InMemoryMappingStore<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<R: ResourceRef> MappingStore<R> for InMemoryMappingStore<R> {
    async fn exists(&self, code: &ShortCode) -> Result<bool> {
        Ok(self.mappings.contains_key(code))
    }

    async fn insert(&self, mapping: NewMapping<R>) -> Result<Mapping<R>> {
        match self.mappings.entry(mapping.code.clone()) {
            Entry::Occupied(_) => Err(MappingError::DuplicateCode(mapping.code.into_inner())),
            Entry::Vacant(slot) => {
                let id = self.next_id.fetch_add(1, Ordering::SeqCst);
                let stored = Mapping::from_new(id, mapping);
                slot.insert(stored.clone());
                Ok(stored)
            }
        }
    }

    async fn find(&self, code: &ShortCode) -> Result<Option<Mapping<R>>> {
        Ok(self.mappings.get(code).map(|m| m.value().clone()))
    }

    async fn increment_usage(&self, code: &ShortCode) -> Result<Option<i64>> {
        Ok(self.mappings.get_mut(code).map(|mut m| {
            m.usage_counter += 1;
            m.usage_counter
        }))
    }

    async fn find_by_owner(&self, owner: &str) -> Result<Vec<Mapping<R>>> {
        Ok(Self::sorted(
            self.mappings
                .iter()
                .filter(|m| m.is_owned_by(owner))
                .map(|m| m.value().clone()),
        ))
    }

    async fn list_all(&self) -> Result<Vec<Mapping<R>>> {
        Ok(Self::sorted(self.mappings.iter().map(|m| m.value().clone())))
    }

    async fn record_lookup_failure(&self, at: DateTime<Utc>) -> Result<()> {
        self.lookup_failures.lock().push(at);
        Ok(())
    }

    async fn stats(&self) -> Result<DomainStats> {
        let (total_mappings, total_usage) = self
            .mappings
            .iter()
            .fold((0i64, 0i64), |(count, usage), m| (count + 1, usage + m.usage_counter));

        Ok(DomainStats {
            total_mappings,
            total_usage,
            total_lookup_failures: self.lookup_failures.lock().len() as i64,
        })
    }
}
