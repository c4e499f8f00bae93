use thiserror::Error;

#[derive(Error, Debug)]
pub enum MappingError {
    /// Code already bound in this domain. Absorbed by the allocator's retry loop.
    #[error("Short code already in use: {0}")]
    DuplicateCode(String),

    #[error("Could not allocate a free short code after {attempts} attempts")]
    AllocationExhausted { attempts: u32 },

    #[error("Short code not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(feature = "sqlite")]
impl From<sqlx::Error> for MappingError {
    fn from(e: sqlx::Error) -> Self {
        MappingError::Storage(e.to_string())
    }
}
