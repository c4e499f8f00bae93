//! Mapping records

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};

use crate::ShortCode;

/// Domain payload bound to a short code.
///
/// The core never looks inside a resource; stores serialize it as JSON and
/// keep one keyspace per `DOMAIN`.
pub trait ResourceRef: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Keyspace name. Must be a plain lowercase identifier, it becomes part of
    /// table names.
    const DOMAIN: &'static str;
}

/// A mapping about to be inserted.
#[derive(Debug, Clone)]
pub struct NewMapping<R> {
    pub code: ShortCode,
    pub resource: R,
    pub owner: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A stored mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct Mapping<R> {
    /// Storage-assigned sequence number
    pub id: i64,
    pub code: ShortCode,
    pub resource: R,
    pub owner: Option<String>,
    /// Successful resolutions so far (clicks, downloads or views)
    pub usage_counter: i64,
    pub created_at: DateTime<Utc>,
}

impl<R> Mapping<R> {
    pub(crate) fn from_new(id: i64, new: NewMapping<R>) -> Self {
        Self {
            id,
            code: new.code,
            resource: new.resource,
            owner: new.owner,
            usage_counter: 0,
            created_at: new.created_at,
        }
    }

    pub fn is_owned_by(&self, subject: &str) -> bool {
        self.owner.as_deref() == Some(subject)
    }
}

/// Aggregate totals for one domain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DomainStats {
    pub total_mappings: i64,
    pub total_usage: i64,
    pub total_lookup_failures: i64,
}
