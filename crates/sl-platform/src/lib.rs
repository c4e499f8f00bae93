//! Shortlink Platform
//!
//! HTTP surface of the four services:
//! - `auth` - account registration and login, the only token issuer
//! - `link` - URL shortening and 307 redirects
//! - `file` - image/PDF upload and inline download
//! - `note` - text notes
//!
//! Resource services verify bearer tokens locally through [`AuthLayer`] and
//! the [`Authenticated`]/[`OptionalAuth`] extractors.
//!
//! ## Module Organization
//!
//! Each aggregate contains:
//! - `entity` - Resource payload or stored entity
//! - `api` - REST endpoints with OpenAPI annotations

pub mod auth;
pub mod file;
pub mod link;
pub mod note;
pub mod shared;

use std::sync::Arc;

use axum::Router;
use sl_token::TokenVerifier;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::openapi::Components;
use utoipa_axum::router::OpenApiRouter;
use utoipa_swagger_ui::SwaggerUi;

pub use shared::error::{PlatformError, Result};
pub use shared::middleware::{AuthContext, AuthLayer, Authenticated, OptionalAuth};

/// Finish a service router: collect its OpenAPI document, mount Swagger UI
/// and, for resource services, install the token verifier.
pub fn build_app(router: OpenApiRouter, title: &str, verifier: Option<Arc<TokenVerifier>>) -> Router {
    let (router, mut openapi) = router.split_for_parts();

    openapi.info.title = title.to_string();
    openapi.info.version = env!("CARGO_PKG_VERSION").to_string();
    openapi
        .components
        .get_or_insert_with(Components::new)
        .add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );

    let app = router.merge(SwaggerUi::new("/swagger-ui").url("/q/openapi", openapi));

    match verifier {
        Some(verifier) => app.layer(AuthLayer::new(verifier)),
        None => app,
    }
}
