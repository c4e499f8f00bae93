//! API Middleware
//!
//! Bearer token extraction for Axum. Tokens are verified locally with the
//! shared secret; no service calls back to the auth service.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use sl_token::{extract_bearer_token, TokenVerifier};
use tower::{Layer, Service};
use tracing::debug;

use crate::shared::error::{ErrorResponse, PlatformError};

/// Verifier shared by every request of a resource service
#[derive(Clone)]
pub struct AppState {
    pub verifier: Arc<TokenVerifier>,
}

/// Identity proven by a bearer token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    /// Token subject (the username)
    pub subject: String,
}

/// Authenticated caller extractor
/// Rejects the request with 401 unless a valid token is present
pub struct Authenticated(pub AuthContext);

impl std::ops::Deref for Authenticated {
    type Target = AuthContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Error response for authentication failures
pub struct AuthError {
    pub status: StatusCode,
    pub error: &'static str,
    pub message: String,
}

impl AuthError {
    fn unauthorized(error: &'static str, message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            error,
            message: message.into(),
        }
    }
}

impl From<PlatformError> for AuthError {
    fn from(err: PlatformError) -> Self {
        match err {
            PlatformError::TokenExpired => Self::unauthorized("TOKEN_EXPIRED", err.to_string()),
            PlatformError::InvalidToken { .. } => Self::unauthorized("INVALID_TOKEN", err.to_string()),
            other => Self::unauthorized("UNAUTHORIZED", other.to_string()),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.error.to_string(),
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v: &HeaderValue| v.to_str().ok())
        .and_then(extract_bearer_token)
}

#[async_trait]
impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get AppState from extensions (set by AuthLayer)
        let app_state = parts.extensions.get::<AppState>().ok_or_else(|| AuthError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: "INTERNAL_ERROR",
            message: "Token verifier not configured".to_string(),
        })?;

        let token = bearer_token(parts)
            .ok_or_else(|| AuthError::unauthorized("UNAUTHORIZED", "Missing authentication token"))?;

        let subject = app_state
            .verifier
            .verify(token)
            .map_err(|e| AuthError::from(PlatformError::from(e)))?;

        Ok(Authenticated(AuthContext { subject }))
    }
}

/// Optional authentication extractor
/// Anonymous when the header is absent or the token does not verify
pub struct OptionalAuth(pub Option<AuthContext>);

impl std::ops::Deref for OptionalAuth {
    type Target = Option<AuthContext>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl OptionalAuth {
    pub fn subject(&self) -> Option<String> {
        self.0.as_ref().map(|ctx| ctx.subject.clone())
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(app_state) = parts.extensions.get::<AppState>() else {
            return Ok(OptionalAuth(None));
        };

        let Some(token) = bearer_token(parts) else {
            return Ok(OptionalAuth(None));
        };

        match app_state.verifier.verify(token) {
            Ok(subject) => Ok(OptionalAuth(Some(AuthContext { subject }))),
            Err(e) => {
                debug!(error = %e, "Ignoring unverifiable token on optional-auth route");
                Ok(OptionalAuth(None))
            }
        }
    }
}

/// Middleware layer that injects AppState into request extensions
/// This enables the Authenticated extractor to work
#[derive(Clone)]
pub struct AuthLayer {
    state: AppState,
}

impl AuthLayer {
    pub fn new(verifier: Arc<TokenVerifier>) -> Self {
        Self {
            state: AppState { verifier },
        }
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthMiddleware {
            inner,
            state: self.state.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AuthMiddleware<S> {
    inner: S,
    state: AppState,
}

impl<S, B> Service<axum::http::Request<B>> for AuthMiddleware<S>
where
    S: Service<axum::http::Request<B>, Response = Response> + Send + Clone + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        req.extensions_mut().insert(self.state.clone());

        let future = self.inner.call(req);
        Box::pin(future)
    }
}
