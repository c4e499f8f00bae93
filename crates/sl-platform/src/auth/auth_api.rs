//! Auth API Endpoints
//!
//! - POST /api/auth/register - Create an account and return a token
//! - POST /api/auth/login - Password login returning a token

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use sl_common::Clock;
use sl_token::TokenIssuer;
use tracing::{info, warn};
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::auth::{PasswordService, UserRepository};
use crate::shared::error::{ErrorResponse, PlatformError, Result};

const USERNAME_MIN_CHARS: usize = 3;
const USERNAME_MAX_CHARS: usize = 100;
const EMAIL_MAX_CHARS: usize = 255;

/// Register request
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Login request
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Token issued on register or login
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    /// Bearer token accepted by every resource service
    pub token: String,
    pub username: String,
    pub email: String,
}

/// Auth service state
#[derive(Clone)]
pub struct AuthApiState {
    pub users: Arc<UserRepository>,
    pub passwords: Arc<PasswordService>,
    pub issuer: Arc<TokenIssuer>,
    pub clock: Arc<dyn Clock>,
}

impl RegisterRequest {
    fn validate(&self) -> Result<()> {
        let username_len = self.username.trim().chars().count();
        if !(USERNAME_MIN_CHARS..=USERNAME_MAX_CHARS).contains(&username_len) {
            return Err(PlatformError::validation(format!(
                "Username must be between {} and {} characters",
                USERNAME_MIN_CHARS, USERNAME_MAX_CHARS
            )));
        }

        let email = self.email.trim();
        if email.is_empty() || !email.contains('@') || email.chars().count() > EMAIL_MAX_CHARS {
            return Err(PlatformError::validation("Email must be valid"));
        }

        Ok(())
    }
}

/// Register a new account
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "auth",
    operation_id = "postAuthRegister",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Account created", body = AuthResponse),
        (status = 400, description = "Invalid input or username/email taken", body = ErrorResponse)
    )
)]
pub async fn register(
    State(state): State<AuthApiState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>> {
    req.validate()?;
    state.passwords.validate_password(&req.password)?;

    let username = req.username.trim();
    let email = req.email.trim();

    if state.users.exists_by_username(username).await? {
        warn!(username = %username, "Registration failed: username already exists");
        return Err(PlatformError::validation("Username already exists"));
    }

    if state.users.exists_by_email(email).await? {
        warn!(email = %email, "Registration failed: email already exists");
        return Err(PlatformError::validation("Email already exists"));
    }

    let password_hash = state.passwords.hash_password(&req.password)?;
    let user = state
        .users
        .insert(username, email, &password_hash, state.clock.now())
        .await?;

    let issued = state.issuer.issue(&user.username)?;
    info!(username = %user.username, "User registered");

    Ok(Json(AuthResponse {
        token: issued.token,
        username: user.username,
        email: user.email,
    }))
}

/// Login with username and password
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    operation_id = "postAuthLogin",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AuthApiState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let user = state
        .users
        .find_by_username(req.username.trim())
        .await?
        .ok_or_else(|| {
            warn!(username = %req.username, "Login failed: unknown user");
            PlatformError::InvalidCredentials
        })?;

    let password_valid = state
        .passwords
        .verify_password(&req.password, &user.password_hash)
        .unwrap_or(false);

    if !password_valid {
        return Err(PlatformError::InvalidCredentials);
    }

    let issued = state.issuer.issue(&user.username)?;
    info!(username = %user.username, "Login successful");

    Ok(Json(AuthResponse {
        token: issued.token,
        username: user.username,
        email: user.email,
    }))
}

/// Create auth router
pub fn auth_router(state: AuthApiState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(register))
        .routes(routes!(login))
        .with_state(state)
}
