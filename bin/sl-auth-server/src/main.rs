//! Shortlink Auth Server
//!
//! Token authority for the resource services:
//! - POST /api/auth/register
//! - POST /api/auth/login
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SHORTLINK_CONFIG` | - | Path to a TOML config file |
//! | `SHORTLINK_HTTP_PORT` | `8080` | HTTP API port (9001 in the standard layout) |
//! | `SHORTLINK_METRICS_PORT` | `9090` | Metrics/health port |
//! | `SHORTLINK_DATABASE_URL` | `sqlite://data/shortlink.db?mode=rwc` | SQLite URL |
//! | `SHORTLINK_JWT_SECRET` | - | Shared token secret, at least 32 bytes |
//! | `SHORTLINK_TOKEN_TTL_SECS` | `86400` | Token lifetime |
//! | `LOG_FORMAT` | `text` | `json` for structured logs |
//! | `RUST_LOG` | `info` | Log level |

use std::sync::Arc;

use anyhow::Result;
use chrono::Duration;
use sl_common::SystemClock;
use sl_config::ConfigLoader;
use sl_platform::auth::{auth_router, Argon2Config, AuthApiState, PasswordPolicy, PasswordService, UserRepository};
use sl_platform::build_app;
use sl_platform::shared::server;
use sl_token::TokenIssuer;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    sl_common::logging::init_logging("sl-auth-server");

    info!("Starting Shortlink Auth Server");

    let config = ConfigLoader::new().load()?;
    config.validate()?;

    let metrics = server::install_metrics_recorder()?;
    let pool = server::connect_sqlite(&config.database).await?;

    let users = UserRepository::new(pool);
    users.init_schema().await?;

    let ttl = Duration::seconds(i64::try_from(config.auth.token_ttl_secs)?);
    let issuer = TokenIssuer::new(config.auth.jwt_secret.as_bytes(), ttl);
    info!(ttl_secs = config.auth.token_ttl_secs, "Token issuer ready");

    let state = AuthApiState {
        users: Arc::new(users),
        passwords: Arc::new(PasswordService::new(Argon2Config::default(), PasswordPolicy::default())?),
        issuer: Arc::new(issuer),
        clock: Arc::new(SystemClock),
    };

    let app = build_app(auth_router(state), "Shortlink Auth API", None);

    server::serve("Shortlink Auth Server", &config.http, app, server::metrics_router(metrics)).await
}
