//! Short code generation and allocation

use std::fmt;
use std::sync::Arc;

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sl_common::{Clock, SystemClock};
use tracing::{debug, error};

use crate::{metric_names, Mapping, MappingError, MappingStore, NewMapping, ResourceRef, Result};

/// Length of every short code.
pub const CODE_LENGTH: usize = 6;

/// Insert attempts before [`MappingError::AllocationExhausted`].
pub const DEFAULT_MAX_ATTEMPTS: u32 = 16;

/// A 6 character code over `[a-zA-Z0-9]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShortCode(String);

impl ShortCode {
    /// Draw a fresh code uniformly from the 62 character alphabet.
    pub fn generate() -> Self {
        Self::generate_with(&mut rand::thread_rng())
    }

    pub fn generate_with<G: Rng + ?Sized>(rng: &mut G) -> Self {
        let code: String = rng
            .sample_iter(&Alphanumeric)
            .take(CODE_LENGTH)
            .map(char::from)
            .collect();
        Self(code)
    }

    /// Validate an externally supplied code.
    pub fn parse(value: &str) -> Option<Self> {
        let valid = value.len() == CODE_LENGTH && value.bytes().all(|b| b.is_ascii_alphanumeric());
        valid.then(|| Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ShortCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ShortCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

type CodeSource = Arc<dyn Fn() -> ShortCode + Send + Sync>;

/// Picks codes for new mappings.
///
/// Allocation never checks for existence first: it attempts the store's
/// atomic insert and treats [`MappingError::DuplicateCode`] as a collision,
/// drawing a new candidate. Two concurrent creations racing for the same code
/// therefore cannot both win.
#[derive(Clone)]
pub struct CodeAllocator {
    max_attempts: u32,
    source: CodeSource,
    clock: Arc<dyn Clock>,
}

impl CodeAllocator {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            source: Arc::new(ShortCode::generate),
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the candidate source (deterministic codes in tests).
    pub fn with_source<F>(mut self, source: F) -> Self
    where
        F: Fn() -> ShortCode + Send + Sync + 'static,
    {
        self.source = Arc::new(source);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Next candidate code. Not reserved; only [`allocate`](Self::allocate)
    /// guarantees uniqueness.
    pub fn generate(&self) -> ShortCode {
        (self.source)()
    }

    /// Bind `resource` to a code not yet used in its domain.
    pub async fn allocate<R: ResourceRef>(
        &self,
        store: &dyn MappingStore<R>,
        resource: R,
        owner: Option<String>,
    ) -> Result<Mapping<R>> {
        let created_at = self.clock.now();

        for attempt in 1..=self.max_attempts {
            let candidate = NewMapping {
                code: self.generate(),
                resource: resource.clone(),
                owner: owner.clone(),
                created_at,
            };

            match store.insert(candidate).await {
                Ok(mapping) => {
                    metrics::counter!(metric_names::MAPPINGS_CREATED, "domain" => R::DOMAIN).increment(1);
                    debug!(
                        domain = R::DOMAIN,
                        code = %mapping.code,
                        attempt,
                        "Short code allocated"
                    );
                    return Ok(mapping);
                }
                Err(MappingError::DuplicateCode(code)) => {
                    metrics::counter!(metric_names::CODE_COLLISIONS, "domain" => R::DOMAIN).increment(1);
                    debug!(domain = R::DOMAIN, code = %code, attempt, "Short code collision, retrying");
                }
                Err(e) => return Err(e),
            }
        }

        error!(
            domain = R::DOMAIN,
            attempts = self.max_attempts,
            "Short code allocation exhausted"
        );
        Err(MappingError::AllocationExhausted { attempts: self.max_attempts })
    }
}

impl Default for CodeAllocator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS)
    }
}

impl fmt::Debug for CodeAllocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodeAllocator")
            .field("max_attempts", &self.max_attempts)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generated_codes_have_fixed_shape() {
        for _ in 0..1000 {
            let code = ShortCode::generate();
            assert_eq!(code.as_str().len(), CODE_LENGTH);
            assert!(code.as_str().chars().all(|c| c.is_ascii_alphanumeric()));
        }
    }

    #[test]
    fn test_generated_codes_cover_alphabet_classes() {
        let mut seen = HashSet::new();
        for _ in 0..2000 {
            seen.extend(ShortCode::generate().as_str().chars());
        }
        assert!(seen.iter().any(|c| c.is_ascii_lowercase()));
        assert!(seen.iter().any(|c| c.is_ascii_uppercase()));
        assert!(seen.iter().any(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_parse_rejects_bad_codes() {
        assert!(ShortCode::parse("aB3xY9").is_some());
        assert!(ShortCode::parse("aB3xY").is_none());
        assert!(ShortCode::parse("aB3xY9z").is_none());
        assert!(ShortCode::parse("aB3-Y9").is_none());
        assert!(ShortCode::parse("ab3xyé").is_none());
        assert!(ShortCode::parse("").is_none());
    }

    #[test]
    fn test_max_attempts_is_at_least_one() {
        assert_eq!(CodeAllocator::new(0).max_attempts(), 1);
        assert_eq!(CodeAllocator::default().max_attempts(), DEFAULT_MAX_ATTEMPTS);
    }

    #[test]
    fn test_custom_source() {
        let allocator = CodeAllocator::default().with_source(|| ShortCode::parse("AAAAAA").unwrap());
        assert_eq!(allocator.generate().as_str(), "AAAAAA");
    }
}
