//! "My resources" read path

use std::sync::Arc;

use crate::{Mapping, MappingStore, ResourceRef, Result};

/// Mappings grouped by the identity that created them.
pub struct OwnershipIndex<R: ResourceRef> {
    store: Arc<dyn MappingStore<R>>,
}

impl<R: ResourceRef> OwnershipIndex<R> {
    pub fn new(store: Arc<dyn MappingStore<R>>) -> Self {
        Self { store }
    }

    /// Mappings owned by `subject`, oldest first. Anonymous mappings never
    /// appear here.
    pub async fn list_for(&self, subject: &str) -> Result<Vec<Mapping<R>>> {
        self.store.find_by_owner(subject).await
    }
}
