//! Allocation and Resolution Integration Tests
//!
//! Tests for:
//! - Unique codes under concurrent creation
//! - Retry after collision and bounded exhaustion
//! - Lost-update freedom of concurrent resolutions
//! - Ownership listing

use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqlitePoolOptions;

use sl_mapping::{
    CodeAllocator, DomainStats, InMemoryMappingStore, Mapping, MappingError, MappingService,
    MappingStore, NewMapping, ResourceRef, ShortCode, SqliteMappingStore, CODE_LENGTH,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Target {
    url: String,
}

impl ResourceRef for Target {
    const DOMAIN: &'static str = "target";
}

fn target(url: &str) -> Target {
    Target { url: url.to_string() }
}

async fn sqlite_store() -> Arc<SqliteMappingStore<Target>> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    let store = SqliteMappingStore::new(pool);
    store.init_schema().await.unwrap();
    Arc::new(store)
}

/// Store whose every insert reports a collision
struct AlwaysCollides {
    inserts: AtomicU32,
}

#[async_trait]
impl MappingStore<Target> for AlwaysCollides {
    async fn exists(&self, _code: &ShortCode) -> sl_mapping::Result<bool> {
        Ok(true)
    }

    async fn insert(&self, mapping: NewMapping<Target>) -> sl_mapping::Result<Mapping<Target>> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        Err(MappingError::DuplicateCode(mapping.code.into_inner()))
    }

    async fn find(&self, _code: &ShortCode) -> sl_mapping::Result<Option<Mapping<Target>>> {
        Ok(None)
    }

    async fn increment_usage(&self, _code: &ShortCode) -> sl_mapping::Result<Option<i64>> {
        Ok(None)
    }

    async fn find_by_owner(&self, _owner: &str) -> sl_mapping::Result<Vec<Mapping<Target>>> {
        Ok(Vec::new())
    }

    async fn list_all(&self) -> sl_mapping::Result<Vec<Mapping<Target>>> {
        Ok(Vec::new())
    }

    async fn record_lookup_failure(&self, _at: DateTime<Utc>) -> sl_mapping::Result<()> {
        Ok(())
    }

    async fn stats(&self) -> sl_mapping::Result<DomainStats> {
        Ok(DomainStats::default())
    }
}

async fn assert_concurrent_creations_are_unique(store: Arc<dyn MappingStore<Target>>) {
    let service = Arc::new(MappingService::new(store.clone(), CodeAllocator::default()));

    let handles: Vec<_> = (0..200)
        .map(|i| {
            let service = service.clone();
            tokio::spawn(async move {
                service
                    .create(target(&format!("https://example.com/{}", i)), None)
                    .await
                    .unwrap()
            })
        })
        .collect();

    let mut codes = HashSet::new();
    for handle in handles {
        let mapping = handle.await.unwrap();
        assert_eq!(mapping.code.as_str().len(), CODE_LENGTH);
        codes.insert(mapping.code);
    }

    assert_eq!(codes.len(), 200);
    assert_eq!(store.list_all().await.unwrap().len(), 200);
}

async fn assert_concurrent_resolutions_are_counted(store: Arc<dyn MappingStore<Target>>) {
    let service = Arc::new(MappingService::new(store.clone(), CodeAllocator::default()));
    let mapping = service.create(target("https://example.com/hot"), None).await.unwrap();

    let handles: Vec<_> = (0..100)
        .map(|_| {
            let service = service.clone();
            let code = mapping.code.to_string();
            tokio::spawn(async move { service.resolve(&code).await.unwrap() })
        })
        .collect();

    for result in futures::future::join_all(handles).await {
        result.unwrap();
    }

    let stored = store.find(&mapping.code).await.unwrap().unwrap();
    assert_eq!(stored.usage_counter, 100);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_creations_unique_in_memory() {
    assert_concurrent_creations_are_unique(Arc::new(InMemoryMappingStore::<Target>::new())).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_creations_unique_sqlite() {
    assert_concurrent_creations_are_unique(sqlite_store().await).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_resolutions_in_memory() {
    assert_concurrent_resolutions_are_counted(Arc::new(InMemoryMappingStore::<Target>::new())).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_resolutions_sqlite() {
    assert_concurrent_resolutions_are_counted(sqlite_store().await).await;
}

#[tokio::test]
async fn test_collision_retries_with_new_candidate() {
    let store: Arc<dyn MappingStore<Target>> = sqlite_store().await;
    let taken = ShortCode::parse("AAAAAA").unwrap();
    store
        .insert(NewMapping {
            code: taken.clone(),
            resource: target("https://example.com/first"),
            owner: None,
            created_at: Utc::now(),
        })
        .await
        .unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let allocator = CodeAllocator::new(4).with_source(move || {
        if counter.fetch_add(1, Ordering::SeqCst) == 0 {
            ShortCode::parse("AAAAAA").unwrap()
        } else {
            ShortCode::parse("BBBBBB").unwrap()
        }
    });

    let mapping = allocator
        .allocate(store.as_ref(), target("https://example.com/second"), None)
        .await
        .unwrap();

    assert_eq!(mapping.code.as_str(), "BBBBBB");
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    // The original binding is untouched
    let first = store.find(&taken).await.unwrap().unwrap();
    assert_eq!(first.resource, target("https://example.com/first"));
}

#[tokio::test]
async fn test_allocation_exhausted_after_bound() {
    let store = AlwaysCollides { inserts: AtomicU32::new(0) };
    let allocator = CodeAllocator::new(5);

    let result = allocator.allocate(&store, target("https://example.com"), None).await;

    assert!(matches!(result, Err(MappingError::AllocationExhausted { attempts: 5 })));
    assert_eq!(store.inserts.load(Ordering::SeqCst), 5);
}

#[tokio::test]
async fn test_unknown_code_never_mutates_counters() {
    let store = sqlite_store().await;
    let service = MappingService::new(store.clone(), CodeAllocator::default());
    let mapping = service.create(target("https://example.com"), None).await.unwrap();
    service.resolve(mapping.code.as_str()).await.unwrap();

    for unknown in ["zzzzzz", "000000", "short", "has/slash"] {
        assert!(matches!(service.resolve(unknown).await, Err(MappingError::NotFound(_))));
    }

    let stats = service.stats().await.unwrap();
    assert_eq!(stats.total_usage, 1);
    assert_eq!(stats.total_lookup_failures, 4);
}

#[tokio::test]
async fn test_ownership_listing_is_per_subject() {
    let service = MappingService::new(Arc::new(InMemoryMappingStore::<Target>::new()), CodeAllocator::default());

    let bobs = service
        .create(target("https://example.com/bob"), Some("bob".to_string()))
        .await
        .unwrap();
    service.create(target("https://example.com/anon"), None).await.unwrap();

    let for_bob = service.list_for("bob").await.unwrap();
    assert_eq!(for_bob.len(), 1);
    assert_eq!(for_bob[0].code, bobs.code);

    assert!(service.list_for("carol").await.unwrap().is_empty());
}
