//! Shortlink Link Server
//!
//! URL shortener:
//! - POST /shorten (optional bearer token)
//! - GET /{code} - 307 redirect
//! - GET /api/urls/my-urls (bearer token)
//! - GET /admin/urls
//! - GET /api/urls/stats
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SHORTLINK_CONFIG` | - | Path to a TOML config file |
//! | `SHORTLINK_HTTP_PORT` | `8080` | HTTP API port (9002 in the standard layout) |
//! | `SHORTLINK_METRICS_PORT` | `9090` | Metrics/health port |
//! | `SHORTLINK_DATABASE_URL` | `sqlite://data/shortlink.db?mode=rwc` | SQLite URL |
//! | `SHORTLINK_JWT_SECRET` | - | Shared token secret, at least 32 bytes |
//! | `SHORTLINK_ALLOCATOR_MAX_ATTEMPTS` | `16` | Code allocation retry bound |
//! | `SHORTLINK_LINK_BASE_URL` | `http://localhost:9002` | Prefix of returned short URLs |
//! | `LOG_FORMAT` | `text` | `json` for structured logs |
//! | `RUST_LOG` | `info` | Log level |

use anyhow::Result;
use sl_config::ConfigLoader;
use sl_platform::build_app;
use sl_platform::link::{link_router, LinkApiState, LinkTarget};
use sl_platform::shared::server;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    sl_common::logging::init_logging("sl-link-server");

    info!("Starting Shortlink Link Server");

    let config = ConfigLoader::new().load()?;
    config.validate()?;

    let metrics = server::install_metrics_recorder()?;
    let pool = server::connect_sqlite(&config.database).await?;

    let state = LinkApiState {
        service: server::mapping_service::<LinkTarget>(pool, &config.allocator).await?,
        base_url: config.link.base_url.clone(),
    };

    let app = build_app(
        link_router(state),
        "Shortlink Link API",
        Some(server::token_verifier(&config.auth)),
    );

    server::serve("Shortlink Link Server", &config.http, app, server::metrics_router(metrics)).await
}
