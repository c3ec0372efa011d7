// =============================================================================
// HANDLERS MODULE
// =============================================================================
// HTTP request handlers (controller layer).
//
// Every grid endpoint follows the same path:
//   batch (cache or storage API) -> filter -> sort -> page / stats / export
// Batches are never modified; each request derives its own view.
// =============================================================================

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::export::{self, export_filename, export_xlsx};
use crate::filter::{filter_items, FilterType};
use crate::grid::{sort_items, Page};
use crate::metrics;
use crate::models::*;
use crate::stats::{compute_stats, is_defective, ItemStats};
use crate::AppState;

// =============================================================================
// HEALTH CHECK ENDPOINTS
// =============================================================================

/// Liveness probe
///
/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: "storage-dashboard".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Readiness probe - storage API and Redis both reachable?
///
/// GET /ready
pub async fn readiness_check(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ReadinessResponse>, StatusCode> {
    let storage_api_healthy = state
        .storage_api
        .health_check(state.config.default_warehouse)
        .await;
    let redis_healthy = state.cache.ping().await;

    let all_healthy = storage_api_healthy && redis_healthy;
    let status = if all_healthy { "ready" } else { "not_ready" };

    let response = ReadinessResponse {
        status: status.to_string(),
        checks: ReadinessChecks {
            storage_api: storage_api_healthy,
            redis: redis_healthy,
        },
    };

    if all_healthy {
        Ok(Json(response))
    } else {
        Err(StatusCode::SERVICE_UNAVAILABLE)
    }
}

/// GET /metrics
pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> String {
    state.metrics_handle.render()
}

// =============================================================================
// BATCH LOADING
// =============================================================================

/// Batch of `warehouse`: from the cache when fresh, else from the storage API.
pub async fn load_batch(state: &AppState, warehouse: i64) -> AppResult<Vec<Item>> {
    if let Some(items) = state.cache.get(warehouse).await {
        tracing::debug!(warehouse, count = items.len(), "Serving cached batch");
        return Ok(items);
    }
    fetch_and_cache(state, warehouse).await
}

/// Load a fresh batch of `warehouse`, bypassing the cache.
///
/// The cached batch is only replaced once the fetch succeeds; on failure the
/// previous batch stays in place and keeps being served.
pub async fn refresh_batch(state: &AppState, warehouse: i64) -> AppResult<Vec<Item>> {
    fetch_and_cache(state, warehouse).await
}

async fn fetch_and_cache(state: &AppState, warehouse: i64) -> AppResult<Vec<Item>> {
    let items = state
        .storage_api
        .fetch_items(warehouse, state.config.fetch_limit)
        .await?;

    let defective = items.iter().filter(|item| is_defective(item)).count();
    metrics::set_batch_levels(warehouse, items.len(), defective);
    tracing::info!(warehouse, count = items.len(), defective, "Loaded item batch");

    state.cache.put(warehouse, &items).await;
    Ok(items)
}

// =============================================================================
// VIEW HELPERS
// =============================================================================

/// Warehouse named by the request, or the configured default.
fn resolve_warehouse(requested: Option<i64>, default: i64) -> AppResult<i64> {
    match requested {
        Some(id) if id <= 0 => Err(AppError::BadRequest(format!(
            "warehouse must be a positive id, got {}",
            id
        ))),
        Some(id) => Ok(id),
        None => Ok(default),
    }
}

/// Filtered and sorted view of `batch`.
fn grid_view<'a>(batch: &'a [Item], query: &ItemsQuery, filters: &FilterOptions) -> Vec<&'a Item> {
    let mut view = filter_items(batch, filters);
    sort_items(&mut view, query.sort, query.direction);
    view
}

fn page_response(batch: &[Item], query: &ItemsQuery, warehouse: i64) -> ItemsPageResponse {
    let filters = query.filter_options(warehouse);
    let view = grid_view(batch, query, &filters);
    let page = Page::new(query.page, query.per_page);

    ItemsPageResponse {
        items: page.slice(&view).iter().map(|item| (*item).clone()).collect(),
        total: view.len(),
        unfiltered_total: batch.len(),
        page: page.page,
        per_page: page.per_page,
        warehouse: filters.warehouse,
    }
}

// =============================================================================
// ITEM API ENDPOINTS
// =============================================================================

// -----------------------------------------------------------------------------
// LIST ITEMS
// -----------------------------------------------------------------------------
/// One page of the filtered, sorted grid
///
/// GET /api/v1/items?search=болт&filter_type=name&page=1&per_page=20&sort=name&direction=asc
///
/// # Response
/// ```json
/// {
///   "items": [...],
///   "total": 37,
///   "unfiltered_total": 15000,
///   "page": 1,
///   "per_page": 20,
///   "warehouse": 1383
/// }
/// ```
pub async fn list_items(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ItemsQuery>,
) -> AppResult<Json<ItemsPageResponse>> {
    let warehouse = resolve_warehouse(query.warehouse, state.config.default_warehouse)?;
    let batch = load_batch(&state, warehouse).await?;
    let response = page_response(&batch, &query, warehouse);

    Ok(Json(response))
}

// -----------------------------------------------------------------------------
// STATS
// -----------------------------------------------------------------------------
/// Summary of the filtered view
///
/// GET /api/v1/items/stats?search=...&filter_type=...
pub async fn item_stats(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ItemsQuery>,
) -> AppResult<Json<ItemStats>> {
    let warehouse = resolve_warehouse(query.warehouse, state.config.default_warehouse)?;
    let batch = load_batch(&state, warehouse).await?;
    let filters = query.filter_options(warehouse);
    let visible = filter_items(&batch, &filters);
    let stats = compute_stats(&batch, &visible);

    Ok(Json(stats))
}

// -----------------------------------------------------------------------------
// EXPORT
// -----------------------------------------------------------------------------
/// xlsx download of the whole filtered, sorted view (not just one page)
///
/// GET /api/v1/items/export?search=...&filter_type=...&sort=...&direction=...
pub async fn export_items(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ItemsQuery>,
) -> AppResult<Response> {
    let warehouse = resolve_warehouse(query.warehouse, state.config.default_warehouse)?;
    let batch = load_batch(&state, warehouse).await?;
    let filters = query.filter_options(warehouse);
    let view = grid_view(&batch, &query, &filters);

    let now = chrono::Local::now().naive_local();
    let body = export_xlsx(&view, now)?;
    let filename = export_filename(now.date());

    tracing::info!(
        warehouse,
        rows = view.len(),
        filename = %filename,
        "Exported item view"
    );

    Ok((
        [
            (header::CONTENT_TYPE, export::CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response())
}

// -----------------------------------------------------------------------------
// REFRESH
// -----------------------------------------------------------------------------
/// Reload the batch from the storage API and replace the cached one
///
/// POST /api/v1/items/refresh?warehouse=1383
pub async fn refresh_items(
    State(state): State<Arc<AppState>>,
    Query(params): Query<WarehouseQuery>,
) -> AppResult<Json<RefreshResponse>> {
    let warehouse = resolve_warehouse(params.warehouse, state.config.default_warehouse)?;
    tracing::info!(warehouse, "Manual refresh requested");
    let items = refresh_batch(&state, warehouse).await?;

    Ok(Json(RefreshResponse {
        warehouse,
        items: items.len(),
    }))
}

// -----------------------------------------------------------------------------
// FILTER SCOPES
// -----------------------------------------------------------------------------
/// Scopes for the search box picker, with labels
///
/// GET /api/v1/filter-types
pub async fn filter_types() -> Json<Vec<FilterTypeInfo>> {
    Json(
        FilterType::SELECTABLE
            .into_iter()
            .map(|value| FilterTypeInfo {
                value,
                label: value.label(),
            })
            .collect(),
    )
}
