//! Shortlink Mapping Core
//!
//! Binds short random codes to resources and tracks how often each code is
//! resolved. One generic implementation serves every resource domain (links,
//! files, notes); a domain only supplies its payload type via [`ResourceRef`].
//!
//! - [`CodeAllocator`] - random 6 character codes, collision-safe insert with a
//!   bounded retry
//! - [`MappingStore`] - persistent keyspace with storage-enforced uniqueness and
//!   atomic usage increments ([`SqliteMappingStore`], [`InMemoryMappingStore`])
//! - [`ResourceResolver`] - public lookup that bumps the usage counter and logs
//!   failed lookups
//! - [`OwnershipIndex`] - "my resources" read path
//! - [`MappingService`] - the four bundled per domain

pub mod code;
pub mod error;
pub mod memory;
pub mod model;
pub mod ownership;
pub mod resolver;
pub mod service;
pub mod store;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use code::{CodeAllocator, ShortCode, CODE_LENGTH, DEFAULT_MAX_ATTEMPTS};
pub use error::MappingError;
pub use memory::InMemoryMappingStore;
pub use model::{DomainStats, Mapping, NewMapping, ResourceRef};
pub use ownership::OwnershipIndex;
pub use resolver::ResourceResolver;
pub use service::MappingService;
pub use store::MappingStore;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteMappingStore;

pub type Result<T> = std::result::Result<T, MappingError>;

/// Metric names emitted by this crate (all carry a `domain` label).
pub mod metric_names {
    pub const MAPPINGS_CREATED: &str = "shortlink_mappings_created_total";
    pub const CODE_COLLISIONS: &str = "shortlink_code_collisions_total";
    pub const RESOLUTIONS: &str = "shortlink_resolutions_total";
    pub const LOOKUP_FAILURES: &str = "shortlink_lookup_failures_total";
}
