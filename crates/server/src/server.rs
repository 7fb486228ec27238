//! Axum router assembly, middleware stack, and graceful shutdown.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::EngineConfig;
use crate::middleware::{api_key_auth, log_requests, request_id};
use crate::routes::{api_info, health, matches, not_found};
use crate::state::ServerState;

/// Build the router: `/` and `/health` are always public; `/matches` sits
/// behind the API-key layer, which is a no-op when no keys are configured
/// (§6).
fn build_router(state: Arc<ServerState>) -> Router {
    let cors = if state.config.enable_cors {
        CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
    } else {
        CorsLayer::new()
    };

    let public_routes = Router::new().route("/", get(api_info)).route("/health", get(health::health_check));

    let protected_routes = Router::new()
        .route("/matches", post(matches::create_match))
        .layer(from_fn_with_state(state.clone(), api_key_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .fallback(not_found)
        .layer(TimeoutLayer::with_status_code(StatusCode::GATEWAY_TIMEOUT, Duration::from_secs(state.config.timeout_secs)))
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(from_fn(request_id))
        .layer(from_fn(log_requests))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start serving. Initializes tracing, the catalog cache and its refresh
/// task, builds the router, and blocks until a shutdown signal arrives.
pub async fn start_server(
    config: EngineConfig,
    catalog_source: Arc<dyn catalog::CatalogSource>,
    persistence: Arc<dyn orchestrator::PersistencePort>,
) -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(&config.log_level)
        .with_target(false)
        .with_thread_ids(true)
        .json()
        .init();

    let catalog = Arc::new(catalog::CatalogCache::new(catalog_source, config.catalog_refresh_ttl()));
    catalog.load().await?;
    catalog.clone().spawn_refresh_task();

    let state = Arc::new(ServerState::new(config.clone(), catalog, persistence)?);
    let app = build_router(state);

    let addr: SocketAddr = config.socket_addr()?;
    tracing::info!(%addr, auth_enabled = !config.api_keys.is_empty(), "starting creator-match-engine server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    tracing::info!("server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received ctrl-c, shutting down"),
        _ = terminate => tracing::info!("received sigterm, shutting down"),
    }
}
