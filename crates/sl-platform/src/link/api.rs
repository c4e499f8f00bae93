//! Link API
//!
//! URL shortening and redirection.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sl_mapping::{Mapping, MappingService};
use tracing::info;
use url::Url;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::link::LinkTarget;
use crate::shared::api_common::{public_url, require_text};
use crate::shared::error::{ErrorResponse, PlatformError, Result};
use crate::shared::middleware::{Authenticated, OptionalAuth};

const LONG_URL_MAX_CHARS: usize = 512;

/// Shorten request
#[derive(Debug, Deserialize, ToSchema)]
pub struct ShortenRequest {
    /// Absolute http(s) URL to shorten
    pub long_url: String,
}

/// Shorten response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ShortenResponse {
    pub long_url: String,
    pub short_url: String,
}

/// Stored URL as listed to its owner or the admin view
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UrlEntry {
    pub id: i64,
    pub short_code: String,
    pub long_url: String,
    pub clicks: i64,
    pub created_at: DateTime<Utc>,
}

impl From<Mapping<LinkTarget>> for UrlEntry {
    fn from(m: Mapping<LinkTarget>) -> Self {
        Self {
            id: m.id,
            short_code: m.code.into_inner(),
            long_url: m.resource.long_url,
            clicks: m.usage_counter,
            created_at: m.created_at,
        }
    }
}

/// Aggregate totals
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UrlStats {
    pub total_urls: i64,
    pub total_clicks: i64,
    pub total_lookup_failures: i64,
}

/// Link service state
#[derive(Clone)]
pub struct LinkApiState {
    pub service: Arc<MappingService<LinkTarget>>,
    pub base_url: String,
}

/// Canonical form of an absolute http(s) URL with a host.
///
/// The canonical form percent-encodes whitespace and control characters, so it
/// is always a valid `Location` header value.
fn validate_long_url(raw: &str) -> Result<String> {
    require_text("long_url", raw, LONG_URL_MAX_CHARS)?;
    let trimmed = raw.trim();

    let parsed = Url::parse(trimmed)
        .map_err(|e| PlatformError::validation(format!("long_url is not a valid URL: {}", e)))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(PlatformError::validation("long_url must use http or https"));
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(PlatformError::validation("long_url must include a host"));
    }

    let canonical = parsed.to_string();
    if canonical.chars().count() > LONG_URL_MAX_CHARS {
        return Err(PlatformError::validation(format!(
            "long_url must be at most {} characters once encoded",
            LONG_URL_MAX_CHARS
        )));
    }

    Ok(canonical)
}

/// Shorten a URL
///
/// Anonymous callers are allowed; a valid bearer token records the caller as owner.
#[utoipa::path(
    post,
    path = "/shorten",
    tag = "links",
    operation_id = "postShorten",
    request_body = ShortenRequest,
    responses(
        (status = 200, description = "URL shortened", body = ShortenResponse),
        (status = 400, description = "Invalid URL", body = ErrorResponse),
        (status = 503, description = "No free short code", body = ErrorResponse)
    ),
    security((), ("bearer_auth" = []))
)]
pub async fn shorten(
    State(state): State<LinkApiState>,
    auth: OptionalAuth,
    Json(req): Json<ShortenRequest>,
) -> Result<Json<ShortenResponse>> {
    let long_url = validate_long_url(&req.long_url)?;
    let owner = auth.subject();

    let mapping = state
        .service
        .create(LinkTarget { long_url }, owner)
        .await?;

    info!(code = %mapping.code, owner = ?mapping.owner, "URL shortened");

    Ok(Json(ShortenResponse {
        short_url: public_url(&state.base_url, mapping.code.as_str()),
        long_url: mapping.resource.long_url,
    }))
}

/// Redirect to the original URL
#[utoipa::path(
    get,
    path = "/{code}",
    tag = "links",
    operation_id = "getRedirect",
    params(("code" = String, Path, description = "Short code")),
    responses(
        (status = 307, description = "Redirect to the long URL"),
        (status = 404, description = "Unknown short code", body = ErrorResponse)
    )
)]
pub async fn redirect(
    State(state): State<LinkApiState>,
    Path(code): Path<String>,
) -> Result<Response> {
    let mapping = state
        .service
        .resolve(&code)
        .await
        .map_err(|e| PlatformError::from_mapping("Short URL", e))?;

    let location = HeaderValue::try_from(mapping.resource.long_url.as_str()).map_err(|_| {
        PlatformError::internal(format!("stored URL for {} is not a valid Location header", mapping.code))
    })?;

    Ok((StatusCode::TEMPORARY_REDIRECT, [(header::LOCATION, location)]).into_response())
}

/// URLs created by the caller
#[utoipa::path(
    get,
    path = "/api/urls/my-urls",
    tag = "links",
    operation_id = "getMyUrls",
    responses(
        (status = 200, description = "Caller's URLs", body = Vec<UrlEntry>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn my_urls(
    State(state): State<LinkApiState>,
    auth: Authenticated,
) -> Result<Json<Vec<UrlEntry>>> {
    let mappings = state.service.list_for(&auth.subject).await?;
    Ok(Json(mappings.into_iter().map(UrlEntry::from).collect()))
}

/// Every stored URL
#[utoipa::path(
    get,
    path = "/admin/urls",
    tag = "links",
    operation_id = "getAllUrls",
    responses((status = 200, description = "All URLs", body = Vec<UrlEntry>))
)]
pub async fn all_urls(State(state): State<LinkApiState>) -> Result<Json<Vec<UrlEntry>>> {
    let mappings = state.service.list_all().await?;
    Ok(Json(mappings.into_iter().map(UrlEntry::from).collect()))
}

/// URL, click and failed lookup totals
#[utoipa::path(
    get,
    path = "/api/urls/stats",
    tag = "links",
    operation_id = "getUrlStats",
    responses((status = 200, description = "Totals", body = UrlStats))
)]
pub async fn url_stats(State(state): State<LinkApiState>) -> Result<Json<UrlStats>> {
    let stats = state.service.stats().await?;
    Ok(Json(UrlStats {
        total_urls: stats.total_mappings,
        total_clicks: stats.total_usage,
        total_lookup_failures: stats.total_lookup_failures,
    }))
}

/// Create link router
pub fn link_router(state: LinkApiState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(shorten))
        .routes(routes!(my_urls))
        .routes(routes!(all_urls))
        .routes(routes!(url_stats))
        .routes(routes!(redirect))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_long_url() {
        assert_eq!(validate_long_url(" https://example.com/a?b=c ").unwrap(), "https://example.com/a?b=c");
        assert_eq!(validate_long_url("http://localhost:8080").unwrap(), "http://localhost:8080/");
        assert_eq!(validate_long_url("https://example.com/a\nb").unwrap(), "https://example.com/ab");
        assert_eq!(validate_long_url("https://example.com/a b").unwrap(), "https://example.com/a%20b");
        assert_eq!(validate_long_url("https://example.com/\u{7f}").unwrap(), "https://example.com/%7F");

        assert!(validate_long_url("").is_err());
        assert!(validate_long_url("example.com").is_err());
        assert!(validate_long_url("ftp://example.com/file").is_err());
        assert!(validate_long_url("javascript:alert(1)").is_err());
        assert!(validate_long_url("mailto:someone@example.com").is_err());

        let too_long = format!("https://example.com/{}", "a".repeat(LONG_URL_MAX_CHARS));
        assert!(validate_long_url(&too_long).is_err());
    }
}
