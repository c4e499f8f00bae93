//! Service bootstrap helpers shared by the server binaries

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderValue, Method},
    routing::get,
    Json, Router,
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use sl_config::{AllocatorConfig, AuthConfig, DatabaseConfig, HttpConfig};
use sl_mapping::{CodeAllocator, MappingService, ResourceRef, SqliteMappingStore};
use sl_token::TokenVerifier;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tokio::{net::TcpListener, signal};
use tower_http::{
    cors::{AllowHeaders, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

/// CORS layer allowing the configured frontend origins
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

/// Open the SQLite pool, creating the database file and its directory.
pub async fn connect_sqlite(config: &DatabaseConfig) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&config.url)?.create_if_missing(true);

    if let Some(parent) = options.get_filename().parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(options)
        .await?;

    info!(url = %config.url, "Connected to SQLite");
    Ok(pool)
}

/// SQLite-backed mapping service for one resource domain, schema created.
pub async fn mapping_service<R: ResourceRef>(
    pool: SqlitePool,
    allocator: &AllocatorConfig,
) -> anyhow::Result<Arc<MappingService<R>>> {
    let store = SqliteMappingStore::<R>::new(pool);
    store.init_schema().await?;

    let service = MappingService::new(Arc::new(store), CodeAllocator::new(allocator.max_attempts));
    info!(domain = R::DOMAIN, max_attempts = allocator.max_attempts, "Mapping store ready");
    Ok(Arc::new(service))
}

/// Local verifier for the shared token secret
pub fn token_verifier(auth: &AuthConfig) -> Arc<TokenVerifier> {
    Arc::new(TokenVerifier::new(auth.jwt_secret.as_bytes()))
}

/// Install the global Prometheus recorder for the `metrics` facade.
pub fn install_metrics_recorder() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    Ok(handle)
}

/// Router for the metrics listener: /metrics, /health, /ready
pub fn metrics_router(handle: PrometheusHandle) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .with_state(handle)
}

async fn metrics_handler(State(handle): State<PrometheusHandle>) -> String {
    handle.render()
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "UP",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn ready_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "READY" }))
}

/// Serve `app` on the public port and `metrics_app` on the metrics port until
/// Ctrl+C or SIGTERM.
pub async fn serve(service_name: &str, http: &HttpConfig, app: Router, metrics_app: Router) -> anyhow::Result<()> {
    let app = app
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&http.cors_origins));

    let api_addr = format!("{}:{}", http.host, http.port);
    let metrics_addr = format!("{}:{}", http.host, http.metrics_port);

    let api_listener = TcpListener::bind(&api_addr).await?;
    let metrics_listener = TcpListener::bind(&metrics_addr).await?;

    info!("{} listening on http://{}", service_name, api_addr);
    info!("Metrics server listening on http://{}/metrics", metrics_addr);

    let metrics_task = tokio::spawn(async move {
        if let Err(e) = axum::serve(metrics_listener, metrics_app).await {
            warn!(error = %e, "Metrics server stopped");
        }
    });

    axum::serve(api_listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    metrics_task.abort();
    info!("{} shutdown complete", service_name);
    Ok(())
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
