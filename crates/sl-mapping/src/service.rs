//! Per-domain facade over allocation, resolution and ownership

use std::sync::Arc;

use sl_common::Clock;

use crate::{
    CodeAllocator, DomainStats, Mapping, MappingStore, OwnershipIndex, ResourceResolver,
    ResourceRef, Result,
};

/// Everything a resource service needs from the mapping core.
pub struct MappingService<R: ResourceRef> {
    store: Arc<dyn MappingStore<R>>,
    allocator: CodeAllocator,
    resolver: ResourceResolver<R>,
    ownership: OwnershipIndex<R>,
}

impl<R: ResourceRef> MappingService<R> {
    pub fn new(store: Arc<dyn MappingStore<R>>, allocator: CodeAllocator) -> Self {
        Self {
            resolver: ResourceResolver::new(store.clone()),
            ownership: OwnershipIndex::new(store.clone()),
            store,
            allocator,
        }
    }

    /// Use `clock` for creation and lookup-failure timestamps.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.allocator = self.allocator.with_clock(clock.clone());
        self.resolver = self.resolver.with_clock(clock);
        self
    }

    /// Store `resource` under a freshly allocated code.
    pub async fn create(&self, resource: R, owner: Option<String>) -> Result<Mapping<R>> {
        self.allocator.allocate(self.store.as_ref(), resource, owner).await
    }

    pub async fn resolve(&self, code: &str) -> Result<Mapping<R>> {
        self.resolver.resolve(code).await
    }

    pub async fn list_for(&self, subject: &str) -> Result<Vec<Mapping<R>>> {
        self.ownership.list_for(subject).await
    }

    pub async fn list_all(&self) -> Result<Vec<Mapping<R>>> {
        self.store.list_all().await
    }

    pub async fn stats(&self) -> Result<DomainStats> {
        self.store.stats().await
    }

    pub fn store(&self) -> &Arc<dyn MappingStore<R>> {
        &self.store
    }
}
