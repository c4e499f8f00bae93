//! Shortlink Bearer Tokens
//!
//! HS256 JWTs carrying a subject and an expiry. The auth service issues them
//! with [`TokenIssuer`]; every resource service checks them with its own
//! [`TokenVerifier`] holding the same secret. Verification is a pure function
//! of the token, the secret and the clock: there is no session store, no call
//! back to the issuer and no revocation. A token stays valid until `exp`.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sl_common::{Clock, SystemClock};
use thiserror::Error;
use tracing::debug;

/// Default token lifetime: 24 hours
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 86400;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Bad signature, malformed token or missing claims
    #[error("Invalid token: {message}")]
    Invalid { message: String },

    #[error("Token expired")]
    Expired,

    #[error("Token subject must not be empty")]
    InvalidSubject,

    #[error("Failed to encode token: {0}")]
    Encoding(String),
}

pub type Result<T> = std::result::Result<T, TokenError>;

/// JWT claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (username)
    pub sub: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// A freshly issued token and its validity window.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub subject: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Signs tokens. Held only by the auth service.
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl TokenIssuer {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            ttl,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for `subject`, valid from now until now + TTL.
    pub fn issue(&self, subject: &str) -> Result<IssuedToken> {
        if subject.trim().is_empty() {
            return Err(TokenError::InvalidSubject);
        }

        let issued_at = self.clock.now();
        let expires_at = issued_at
            .checked_add_signed(self.ttl)
            .ok_or_else(|| TokenError::Encoding(format!("token TTL {} overflows the expiry timestamp", self.ttl)))?;

        let claims = TokenClaims {
            sub: subject.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))?;

        debug!(subject = %subject, expires_at = %expires_at, "Token issued");

        Ok(IssuedToken {
            token,
            subject: claims.sub,
            issued_at,
            expires_at,
        })
    }
}

impl fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenIssuer").field("ttl", &self.ttl).finish_non_exhaustive()
    }
}

/// Checks tokens locally. Every resource service holds one.
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
    clock: Arc<dyn Clock>,
}

impl TokenVerifier {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against the injected clock below
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.required_spec_claims = HashSet::from(["exp".to_string(), "sub".to_string()]);

        Self {
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Validate signature and expiry, returning the claims.
    pub fn verify_claims(&self, token: &str) -> Result<TokenClaims> {
        let claims = decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid { message: e.to_string() },
            })?;

        let expires_at = DateTime::<Utc>::from_timestamp(claims.exp, 0).ok_or_else(|| TokenError::Invalid {
            message: format!("exp out of range: {}", claims.exp),
        })?;

        if self.clock.now() > expires_at {
            return Err(TokenError::Expired);
        }

        if claims.sub.is_empty() {
            return Err(TokenError::Invalid { message: "empty subject".to_string() });
        }

        Ok(claims)
    }

    /// Validate signature and expiry, returning the subject.
    pub fn verify(&self, token: &str) -> Result<String> {
        self.verify_claims(token).map(|claims| claims.sub)
    }
}

impl fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenVerifier").finish_non_exhaustive()
    }
}

/// Extract bearer token from Authorization header
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
