//! Platform Error Types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use sl_mapping::MappingError;
use sl_token::TokenError;
use thiserror::Error;
use tracing::error;
use utoipa::ToSchema;

#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("{entity_type} not found: {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Authorization error: {message}")]
    Unauthorized { message: String },

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {message}")]
    InvalidToken { message: String },

    #[error("No free short code after {attempts} attempts")]
    AllocationExhausted { attempts: u32 },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl PlatformError {
    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation { message: message.into() }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized { message: message.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }

    /// Convert a mapping error, naming the entity in not-found messages.
    pub fn from_mapping(entity_type: &str, err: MappingError) -> Self {
        match err {
            MappingError::NotFound(code) => Self::not_found(entity_type, code),
            other => other.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PlatformError>;

/// Error response body
#[derive(Debug, serde::Serialize, serde::Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for PlatformError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            PlatformError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            PlatformError::Validation { .. } => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            PlatformError::Unauthorized { .. } => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            PlatformError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
            PlatformError::TokenExpired => (StatusCode::UNAUTHORIZED, "TOKEN_EXPIRED"),
            PlatformError::InvalidToken { .. } => (StatusCode::UNAUTHORIZED, "INVALID_TOKEN"),
            PlatformError::AllocationExhausted { .. } => (StatusCode::SERVICE_UNAVAILABLE, "ALLOCATION_EXHAUSTED"),
            PlatformError::Storage { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
            PlatformError::Internal { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }

        let body = ErrorResponse {
            error: error_type.to_string(),
            message: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<MappingError> for PlatformError {
    fn from(err: MappingError) -> Self {
        match err {
            MappingError::NotFound(code) => PlatformError::not_found("Short code", code),
            MappingError::AllocationExhausted { attempts } => PlatformError::AllocationExhausted { attempts },
            // The allocator retries these; one escaping is a bug
            MappingError::DuplicateCode(code) => PlatformError::internal(format!("unresolved code collision on {code}")),
            MappingError::Storage(message) => PlatformError::Storage { message },
            MappingError::Serialization(e) => PlatformError::Storage { message: e.to_string() },
        }
    }
}

impl From<TokenError> for PlatformError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => PlatformError::TokenExpired,
            TokenError::Invalid { message } => PlatformError::InvalidToken { message },
            TokenError::InvalidSubject => PlatformError::validation("Token subject must not be empty"),
            TokenError::Encoding(message) => PlatformError::Internal { message },
        }
    }
}

impl From<sqlx::Error> for PlatformError {
    fn from(err: sqlx::Error) -> Self {
        PlatformError::Storage { message: err.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (PlatformError::validation("bad"), StatusCode::BAD_REQUEST),
            (PlatformError::not_found("Note", "abc123"), StatusCode::NOT_FOUND),
            (PlatformError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (PlatformError::TokenExpired, StatusCode::UNAUTHORIZED),
            (PlatformError::AllocationExhausted { attempts: 16 }, StatusCode::SERVICE_UNAVAILABLE),
            (PlatformError::Storage { message: "disk".into() }, StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_mapping_not_found_names_entity() {
        let err = PlatformError::from_mapping("Note", MappingError::NotFound("Abc123".into()));
        assert_eq!(err.to_string(), "Note not found: Abc123");
    }

    #[test]
    fn test_token_errors_are_unauthorized() {
        let expired: PlatformError = TokenError::Expired.into();
        let invalid: PlatformError = TokenError::Invalid { message: "bad signature".into() }.into();

        assert!(matches!(expired, PlatformError::TokenExpired));
        assert!(matches!(invalid, PlatformError::InvalidToken { .. }));
    }
}
