//! Shortlink Note Server
//!
//! Note sharing:
//! - POST /api/notes/save (bearer token)
//! - GET /n/{code}
//! - GET /api/notes/my-notes (bearer token)
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SHORTLINK_CONFIG` | - | Path to a TOML config file |
//! | `SHORTLINK_HTTP_PORT` | `8080` | HTTP API port (9004 in the standard layout) |
//! | `SHORTLINK_METRICS_PORT` | `9090` | Metrics/health port |
//! | `SHORTLINK_DATABASE_URL` | `sqlite://data/shortlink.db?mode=rwc` | SQLite URL |
//! | `SHORTLINK_JWT_SECRET` | - | Shared token secret, at least 32 bytes |
//! | `SHORTLINK_NOTE_BASE_URL` | `http://localhost:9004` | Prefix of returned short URLs |
//! | `LOG_FORMAT` | `text` | `json` for structured logs |
//! | `RUST_LOG` | `info` | Log level |

use anyhow::Result;
use sl_config::ConfigLoader;
use sl_platform::build_app;
use sl_platform::note::{note_router, Note, NoteApiState};
use sl_platform::shared::server;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    sl_common::logging::init_logging("sl-note-server");

    info!("Starting Shortlink Note Server");

    let config = ConfigLoader::new().load()?;
    config.validate()?;

    let metrics = server::install_metrics_recorder()?;
    let pool = server::connect_sqlite(&config.database).await?;

    let state = NoteApiState {
        service: server::mapping_service::<Note>(pool, &config.allocator).await?,
        base_url: config.note.base_url.clone(),
    };

    let app = build_app(
        note_router(state),
        "Shortlink Note API",
        Some(server::token_verifier(&config.auth)),
    );

    server::serve("Shortlink Note Server", &config.http, app, server::metrics_router(metrics)).await
}
