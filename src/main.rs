// =============================================================================
// STORAGE DASHBOARD SERVICE - Main Entry Point
// =============================================================================
// WHAT THIS SERVICE DOES:
// - Loads warehouse storage items from the storage API and normalizes them
// - Serves the dashboard grid: search by field scope, sort, paginate
// - Summarizes the filtered view and exports it as a spreadsheet
// - Caches item batches in Redis and re-warms the default warehouse
// - Exposes Prometheus metrics
// =============================================================================

mod cache;       // Redis batch cache (cache.rs)
mod config;      // Configuration loading (config.rs)
mod error;       // Error types (error.rs)
mod export;      // xlsx export (export.rs)
mod filter;      // Search filtering (filter.rs)
mod format;      // Display formatters (format.rs)
mod grid;        // Sorting and pagination (grid.rs)
mod handlers;    // HTTP request handlers (handlers.rs)
mod metrics;     // Prometheus metrics setup (metrics.rs)
mod models;      // Data structures (models.rs)
mod normalize;   // Raw record -> Item (normalize.rs)
mod stats;       // Summary of the filtered view (stats.rs)
mod storage_api; // Upstream HTTP client (storage_api.rs)

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cache::ItemCache;
use crate::config::Config;
use crate::metrics::setup_metrics;
use crate::storage_api::StorageApi;

// -----------------------------------------------------------------------------
// APPLICATION STATE
// -----------------------------------------------------------------------------
// Shared by every handler through State<Arc<AppState>>. Nothing in here is
// mutated after startup: batches live in Redis, not in the state.
pub struct AppState {
    pub config: Config,

    /// Upstream storage API client
    pub storage_api: StorageApi,

    /// Redis batch cache
    pub cache: ItemCache,

    /// Prometheus metrics handle
    pub metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -------------------------------------------------------------------------
    // STEP 1: Environment and logging
    // -------------------------------------------------------------------------
    dotenvy::dotenv().ok();

    // RUST_LOG controls levels, e.g. RUST_LOG=info,storage_dashboard=debug
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,storage_dashboard=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("Starting Storage Dashboard Service...");

    // -------------------------------------------------------------------------
    // STEP 2: Configuration and metrics
    // -------------------------------------------------------------------------
    let config = Config::from_env()?;
    info!(
        port = config.port,
        storage_api = %config.storage_api_url,
        default_warehouse = config.default_warehouse,
        "Configuration loaded"
    );

    let metrics_handle = setup_metrics()?;
    info!("Prometheus metrics initialized");

    // -------------------------------------------------------------------------
    // STEP 3: Upstream client and Redis
    // -------------------------------------------------------------------------
    let storage_api = StorageApi::new(&config.storage_api_url, config.request_timeout)?;

    let redis_client = redis::Client::open(config.redis_url.as_str())?;
    let redis_conn = redis::aio::ConnectionManager::new(redis_client).await?;
    let cache = ItemCache::new(redis_conn, config.cache_ttl_secs);
    info!("Connected to Redis");

    let state = Arc::new(AppState {
        config,
        storage_api,
        cache,
        metrics_handle,
    });

    // -------------------------------------------------------------------------
    // STEP 4: Background refresh of the default warehouse
    // -------------------------------------------------------------------------
    tokio::spawn(refresh_loop(state.clone()));

    // -------------------------------------------------------------------------
    // STEP 5: Routes
    // -------------------------------------------------------------------------
    let app = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_handler))
        .route("/api/v1/items", get(handlers::list_items))
        .route("/api/v1/items/stats", get(handlers::item_stats))
        .route("/api/v1/items/export", get(handlers::export_items))
        .route("/api/v1/items/refresh", post(handlers::refresh_items))
        .route("/api/v1/filter-types", get(handlers::filter_types))
        // Counts every routed request, error responses included
        .route_layer(axum::middleware::from_fn(metrics::track_http))
        // The dashboard frontend is served from another origin
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());

    // -------------------------------------------------------------------------
    // STEP 6: Serve
    // -------------------------------------------------------------------------
    let addr = format!("0.0.0.0:{}", state.config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(address = %addr, "Storage Dashboard Service is listening");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Reload the default warehouse every `refresh_interval`.
///
/// The first tick fires immediately, which warms the cache at startup.
/// Failures are logged; the next tick simply tries again.
async fn refresh_loop(state: Arc<AppState>) {
    let warehouse = state.config.default_warehouse;
    let mut ticker = tokio::time::interval(state.config.refresh_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        match handlers::refresh_batch(&state, warehouse).await {
            Ok(items) => info!(warehouse, count = items.len(), "Scheduled refresh done"),
            Err(e) => tracing::warn!(warehouse, error = %e, "Scheduled refresh failed"),
        }
    }
}
