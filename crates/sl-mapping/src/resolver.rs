//! Public code resolution

use std::sync::Arc;

use sl_common::{Clock, SystemClock};
use tracing::{debug, info};

use crate::{metric_names, Mapping, MappingError, MappingStore, ResourceRef, Result, ShortCode};

/// Turns a code into its resource, counting the use.
///
/// Every successful resolution bumps the mapping's usage counter through the
/// store's atomic increment before the mapping is returned. Unknown codes
/// record a lookup-failure event and change no counter.
pub struct ResourceResolver<R: ResourceRef> {
    store: Arc<dyn MappingStore<R>>,
    clock: Arc<dyn Clock>,
}

impl<R: ResourceRef> ResourceResolver<R> {
    pub fn new(store: Arc<dyn MappingStore<R>>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Resolve `code`. The returned mapping carries the incremented counter.
    pub async fn resolve(&self, code: &str) -> Result<Mapping<R>> {
        let Some(short_code) = ShortCode::parse(code) else {
            return self.not_found(code).await;
        };

        let Some(mut mapping) = self.store.find(&short_code).await? else {
            return self.not_found(code).await;
        };

        let Some(usage_counter) = self.store.increment_usage(&short_code).await? else {
            return self.not_found(code).await;
        };
        mapping.usage_counter = usage_counter;

        metrics::counter!(metric_names::RESOLUTIONS, "domain" => R::DOMAIN).increment(1);
        debug!(domain = R::DOMAIN, code = %short_code, usage_counter, "Short code resolved");

        Ok(mapping)
    }

    async fn not_found(&self, code: &str) -> Result<Mapping<R>> {
        self.store.record_lookup_failure(self.clock.now()).await?;
        metrics::counter!(metric_names::LOOKUP_FAILURES, "domain" => R::DOMAIN).increment(1);
        info!(domain = R::DOMAIN, code = %code, "Short code lookup failed");
        Err(MappingError::NotFound(code.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{InMemoryMappingStore, NewMapping};
    use chrono::{TimeZone, Utc};
    use serde::{Deserialize, Serialize};
    use sl_common::FixedClock;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Page(String);

    impl ResourceRef for Page {
        const DOMAIN: &'static str = "page";
    }

    async fn seeded() -> (Arc<InMemoryMappingStore<Page>>, ResourceResolver<Page>) {
        let store = Arc::new(InMemoryMappingStore::new());
        store
            .insert(NewMapping {
                code: ShortCode::parse("Abc123").unwrap(),
                resource: Page("https://example.com".to_string()),
                owner: None,
                created_at: Utc::now(),
            })
            .await
            .unwrap();
        let resolver = ResourceResolver::new(store.clone());
        (store, resolver)
    }

    #[tokio::test]
    async fn test_resolve_increments_by_one() {
        let (_store, resolver) = seeded().await;

        let first = resolver.resolve("Abc123").await.unwrap();
        let second = resolver.resolve("Abc123").await.unwrap();

        assert_eq!(first.resource, Page("https://example.com".to_string()));
        assert_eq!(first.usage_counter, 1);
        assert_eq!(second.usage_counter, 2);
    }

    #[tokio::test]
    async fn test_unknown_code_records_failure_without_mutation() {
        let (store, resolver) = seeded().await;
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let resolver = resolver.with_clock(Arc::new(FixedClock::new(at)));

        let result = resolver.resolve("Zzz999").await;

        assert!(matches!(result, Err(MappingError::NotFound(code)) if code == "Zzz999"));
        assert_eq!(store.lookup_failures(), vec![at]);
        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total_usage, 0);
    }

    #[tokio::test]
    async fn test_malformed_code_is_not_found() {
        let (store, resolver) = seeded().await;

        assert!(matches!(resolver.resolve("../etc").await, Err(MappingError::NotFound(_))));
        assert!(matches!(resolver.resolve("").await, Err(MappingError::NotFound(_))));
        assert_eq!(store.lookup_failures().len(), 2);
    }
}
