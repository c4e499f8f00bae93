//! Shortlink File Server
//!
//! File sharing:
//! - POST /api/files/upload (bearer token, multipart field `file`)
//! - GET /f/{code} - inline download
//! - GET /api/files/my-files (bearer token)
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SHORTLINK_CONFIG` | - | Path to a TOML config file |
//! | `SHORTLINK_HTTP_PORT` | `8080` | HTTP API port (9003 in the standard layout) |
//! | `SHORTLINK_METRICS_PORT` | `9090` | Metrics/health port |
//! | `SHORTLINK_DATABASE_URL` | `sqlite://data/shortlink.db?mode=rwc` | SQLite URL |
//! | `SHORTLINK_JWT_SECRET` | - | Shared token secret, at least 32 bytes |
//! | `SHORTLINK_FILE_BASE_URL` | `http://localhost:9003` | Prefix of returned short URLs |
//! | `SHORTLINK_UPLOAD_DIR` | `./uploads` | Blob directory |
//! | `SHORTLINK_MAX_FILE_SIZE` | `10485760` | Upload limit in bytes |
//! | `LOG_FORMAT` | `text` | `json` for structured logs |
//! | `RUST_LOG` | `info` | Log level |

use std::sync::Arc;

use anyhow::Result;
use sl_config::ConfigLoader;
use sl_platform::build_app;
use sl_platform::file::{file_router, upload_body_limit, FileApiState, LocalBlobStore, StoredFile};
use sl_platform::shared::server;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    sl_common::logging::init_logging("sl-file-server");

    info!("Starting Shortlink File Server");

    let config = ConfigLoader::new().load()?;
    config.validate()?;

    let metrics = server::install_metrics_recorder()?;
    let pool = server::connect_sqlite(&config.database).await?;

    let blobs = LocalBlobStore::open(&config.file.upload_dir).await?;
    info!(upload_dir = %blobs.root().display(), max_file_size = config.file.max_file_size, "Blob store ready");

    let state = FileApiState {
        service: server::mapping_service::<StoredFile>(pool, &config.allocator).await?,
        blobs: Arc::new(blobs),
        base_url: config.file.base_url.clone(),
        max_file_size: config.file.max_file_size,
    };

    let app = build_app(
        file_router(state),
        "Shortlink File API",
        Some(server::token_verifier(&config.auth)),
    )
    .layer(upload_body_limit(config.file.max_file_size));

    server::serve("Shortlink File Server", &config.http, app, server::metrics_router(metrics)).await
}
