// =============================================================================
// METRICS MODULE
// =============================================================================
// Prometheus metrics for the dashboard service.
//
// METRIC TYPES USED HERE:
// - Counter: requests, upstream retries
// - Gauge: batch size and defective count per warehouse
// - Histogram: HTTP, storage API and Redis latencies
// =============================================================================

use std::time::Instant;

use anyhow::Result;
use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};

// =============================================================================
// METRIC NAMES
// =============================================================================

/// Labels: method, endpoint, status
pub const HTTP_REQUESTS_TOTAL: &str = "http_requests_total";

/// Labels: method, endpoint
pub const HTTP_REQUEST_DURATION_SECONDS: &str = "http_request_duration_seconds";

/// Labels: outcome (success/failed)
pub const STORAGE_API_REQUEST_DURATION_SECONDS: &str = "storage_api_request_duration_seconds";

pub const STORAGE_API_RETRIES_TOTAL: &str = "storage_api_retries_total";

/// Labels: operation (get/set/delete)
pub const REDIS_OPERATION_DURATION_SECONDS: &str = "redis_operation_duration_seconds";

/// Labels: warehouse
pub const STORAGE_ITEMS_LOADED: &str = "storage_items_loaded";

/// Labels: warehouse
pub const STORAGE_DEFECTIVE_ITEMS: &str = "storage_defective_items";

// =============================================================================
// SETUP FUNCTION
// =============================================================================
/// Install the Prometheus recorder and describe every metric.
pub fn setup_metrics() -> Result<PrometheusHandle> {
    // 1ms .. 10s; upstream fetches of a whole warehouse sit at the top end
    let latency_buckets = &[
        0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
    ];

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(HTTP_REQUEST_DURATION_SECONDS.to_string()),
            latency_buckets,
        )?
        .set_buckets_for_metric(
            Matcher::Full(STORAGE_API_REQUEST_DURATION_SECONDS.to_string()),
            latency_buckets,
        )?
        .set_buckets_for_metric(
            Matcher::Full(REDIS_OPERATION_DURATION_SECONDS.to_string()),
            latency_buckets,
        )?
        .install_recorder()?;

    describe_counter!(HTTP_REQUESTS_TOTAL, "Total number of HTTP requests received");
    describe_histogram!(HTTP_REQUEST_DURATION_SECONDS, "HTTP request latency in seconds");
    describe_histogram!(
        STORAGE_API_REQUEST_DURATION_SECONDS,
        "Storage API request latency in seconds"
    );
    describe_counter!(
        STORAGE_API_RETRIES_TOTAL,
        "Number of storage API requests retried after a failure"
    );
    describe_histogram!(
        REDIS_OPERATION_DURATION_SECONDS,
        "Redis operation latency in seconds"
    );
    describe_gauge!(STORAGE_ITEMS_LOADED, "Items in the latest batch per warehouse");
    describe_gauge!(
        STORAGE_DEFECTIVE_ITEMS,
        "Defective items in the latest batch per warehouse"
    );

    Ok(handle)
}

// =============================================================================
// HTTP MIDDLEWARE
// =============================================================================
/// Count and time every routed request with its final status, error
/// responses included.
///
/// Installed with `route_layer`, so the matched route template is always
/// there and `endpoint` keeps a bounded set of values.
pub async fn track_http(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let endpoint = req
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(req).await;

    record_http_request(
        &method,
        &endpoint,
        response.status().as_u16(),
        start.elapsed().as_secs_f64(),
    );
    response
}

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

pub fn record_http_request(method: &str, endpoint: &str, status: u16, duration_secs: f64) {
    counter!(
        HTTP_REQUESTS_TOTAL,
        "method" => method.to_string(),
        "endpoint" => endpoint.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        HTTP_REQUEST_DURATION_SECONDS,
        "method" => method.to_string(),
        "endpoint" => endpoint.to_string()
    )
    .record(duration_secs);
}

pub fn record_storage_api_request(success: bool, duration_secs: f64) {
    let outcome = if success { "success" } else { "failed" };
    histogram!(
        STORAGE_API_REQUEST_DURATION_SECONDS,
        "outcome" => outcome.to_string()
    )
    .record(duration_secs);
}

pub fn record_storage_api_retry() {
    counter!(STORAGE_API_RETRIES_TOTAL).increment(1);
}

pub fn record_redis_operation(operation: &str, duration_secs: f64) {
    histogram!(
        REDIS_OPERATION_DURATION_SECONDS,
        "operation" => operation.to_string()
    )
    .record(duration_secs);
}

/// Publish the size and defective count of a freshly loaded batch.
pub fn set_batch_levels(warehouse: i64, items: usize, defective: usize) {
    gauge!(STORAGE_ITEMS_LOADED, "warehouse" => warehouse.to_string()).set(items as f64);
    gauge!(STORAGE_DEFECTIVE_ITEMS, "warehouse" => warehouse.to_string()).set(defective as f64);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, AppResult};
    use axum::{middleware, routing::get, Router};

    async fn ok() -> &'static str {
        "ok"
    }

    async fn bad() -> AppResult<&'static str> {
        Err(AppError::BadRequest("warehouse must be a positive id".to_string()))
    }

    #[test]
    fn test_failed_requests_are_counted() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("runtime");

            runtime.block_on(async {
                let app = Router::new()
                    .route("/ok", get(ok))
                    .route("/bad", get(bad))
                    .route_layer(middleware::from_fn(track_http));

                let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                    .await
                    .expect("bind");
                let addr = listener.local_addr().expect("addr");
                tokio::spawn(async move {
                    axum::serve(listener, app).await.expect("server");
                });

                let client = reqwest::Client::new();
                for path in ["/ok", "/bad"] {
                    client
                        .get(format!("http://{}{}", addr, path))
                        .send()
                        .await
                        .expect("request");
                }
            });
        });

        let rendered = handle.render();
        let line = |endpoint: &str| {
            rendered
                .lines()
                .find(|l| l.starts_with(HTTP_REQUESTS_TOTAL) && l.contains(endpoint))
                .map(str::to_string)
                .unwrap_or_default()
        };
        assert!(line("endpoint=\"/ok\"").contains("status=\"200\""));
        assert!(line("endpoint=\"/bad\"").contains("status=\"400\""));
    }
}
