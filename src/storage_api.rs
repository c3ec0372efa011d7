// =============================================================================
// STORAGE API MODULE
// =============================================================================
// HTTP client for the upstream storage API, the source of every item batch.
//
// LEARNING NOTES:
// - One `reqwest::Client` is built at startup and cloned into the app state;
//   clones share the same connection pool.
// - Failed fetches are retried with exponential backoff before the error is
//   handed to the caller.
// - The payload is parsed leniently: see `parse_items_response`.
// =============================================================================

use std::time::{Duration, Instant};

use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::metrics;
use crate::models::Item;
use crate::normalize::normalize_batch;

/// Retries after the first attempt.
pub const MAX_RETRIES: u32 = 3;

/// Wait before the first retry; doubled for each further one.
const RETRY_BASE_DELAY: Duration = Duration::from_secs(1);

/// Longest wait between two attempts.
const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

// -----------------------------------------------------------------------------
// CLIENT
// -----------------------------------------------------------------------------
#[derive(Clone)]
pub struct StorageApi {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
    retry_base: Duration,
}

impl StorageApi {
    /// Build a client for the storage API at `base_url`.
    ///
    /// # Errors
    /// Fails only if the TLS backend can't be initialized.
    pub fn new(base_url: &str, timeout: Duration) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_retries: MAX_RETRIES,
            retry_base: RETRY_BASE_DELAY,
        })
    }

    #[cfg(test)]
    pub(crate) fn with_retries(mut self, max_retries: u32, retry_base: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_base = retry_base;
        self
    }

    fn items_url(&self) -> String {
        format!("{}/api/storage/all", self.base_url)
    }

    // -------------------------------------------------------------------------
    // FETCH ITEMS
    // -------------------------------------------------------------------------
    /// Fetch and normalize the item batch of one warehouse.
    ///
    /// Retries up to `MAX_RETRIES` times, waiting `retry_delay(..)` between
    /// attempts. The last error is returned if all attempts fail.
    pub async fn fetch_items(&self, warehouse: i64, limit: u32) -> AppResult<Vec<Item>> {
        let mut attempt = 0;
        loop {
            let start = Instant::now();
            let result = self.fetch_once(warehouse, limit).await;
            metrics::record_storage_api_request(result.is_ok(), start.elapsed().as_secs_f64());

            match result {
                Ok(items) => {
                    tracing::debug!(warehouse, count = items.len(), attempt, "Fetched item batch");
                    return Ok(items);
                }
                Err(e) if attempt < self.max_retries => {
                    let delay = retry_delay(self.retry_base, attempt);
                    tracing::warn!(
                        warehouse,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Storage API request failed, retrying"
                    );
                    metrics::record_storage_api_retry();
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!(warehouse, error = %e, "Storage API request failed");
                    return Err(e);
                }
            }
        }
    }

    async fn fetch_once(&self, warehouse: i64, limit: u32) -> AppResult<Vec<Item>> {
        let response = self
            .client
            .get(self.items_url())
            .query(&[("limit", limit as i64), ("id_sklad", warehouse)])
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body: Option<Value> = response.json().await.ok();
            return Err(upstream_error(status.as_u16(), body.as_ref()));
        }

        let body: Value = response.json().await?;
        Ok(parse_items_response(body))
    }

    // -------------------------------------------------------------------------
    // HEALTH CHECK
    // -------------------------------------------------------------------------
    /// Is the storage API answering with a success status?
    pub async fn health_check(&self, warehouse: i64) -> bool {
        self.client
            .get(self.items_url())
            .query(&[("limit", 1), ("id_sklad", warehouse)])
            .send()
            .await
            .map(|response| response.status().is_success())
            .unwrap_or(false)
    }
}

// =============================================================================
// RESPONSE HANDLING
// =============================================================================

/// Extract and normalize `data.items` from a response envelope.
///
/// Envelope: `{ "data": { "items": [...], "total": n }, "success": bool }`.
/// A missing or non-array `data.items` means an empty batch.
pub fn parse_items_response(body: Value) -> Vec<Item> {
    match body {
        Value::Object(mut envelope) => match envelope.remove("data") {
            Some(Value::Object(mut data)) => match data.remove("items") {
                Some(Value::Array(items)) => normalize_batch(items),
                _ => Vec::new(),
            },
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// Build the error for a non-success response, preferring the server's own
/// `message` field.
fn upstream_error(status: u16, body: Option<&Value>) -> AppError {
    let message = body
        .and_then(|b| b.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status));
    AppError::Upstream { status, message }
}

/// Backoff before retry number `attempt + 1`: base, 2·base, 4·base, ...
/// capped at 30s.
pub fn retry_delay(base: Duration, attempt: u32) -> Duration {
    let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
    base.saturating_mul(factor).min(MAX_RETRY_DELAY)
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_envelope() {
        let body = json!({
            "success": true,
            "data": {
                "total": 2,
                "items": [
                    { "name": "Bolt", "placeQnt": "24", "productQnt": "6" },
                    { "name": "Nut" }
                ]
            }
        });
        let items = parse_items_response(body);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].quantity, 4);
        assert_eq!(items[1].name, "Nut");
    }

    #[test]
    fn test_missing_items_is_empty_batch() {
        assert!(parse_items_response(json!({ "success": true })).is_empty());
        assert!(parse_items_response(json!({ "data": {} })).is_empty());
        assert!(parse_items_response(json!({ "data": { "items": null } })).is_empty());
        assert!(parse_items_response(json!([1, 2, 3])).is_empty());
    }

    #[test]
    fn test_upstream_error_prefers_server_message() {
        let err = upstream_error(500, Some(&json!({ "message": "db down" })));
        assert!(matches!(err, AppError::Upstream { status: 500, ref message } if message == "db down"));

        let err = upstream_error(404, None);
        assert!(matches!(err, AppError::Upstream { ref message, .. } if message == "HTTP 404"));
    }

    #[test]
    fn test_retry_delay_backoff() {
        let base = RETRY_BASE_DELAY;
        assert_eq!(retry_delay(base, 0), Duration::from_secs(1));
        assert_eq!(retry_delay(base, 1), Duration::from_secs(2));
        assert_eq!(retry_delay(base, 2), Duration::from_secs(4));
        assert_eq!(retry_delay(base, 5), Duration::from_secs(30));
        assert_eq!(retry_delay(base, 80), Duration::from_secs(30));
    }

    fn client(base_url: &str, retries: u32) -> StorageApi {
        StorageApi::new(base_url, Duration::from_secs(5))
            .expect("client")
            .with_retries(retries, Duration::from_millis(5))
    }

    #[tokio::test]
    async fn test_fetch_recovers_after_failures() {
        let storage = stub::spawn(2).await;
        let items = client(&storage.base_url, 3)
            .fetch_items(1383, 100)
            .await
            .expect("third attempt succeeds");

        assert_eq!(storage.calls(), 3);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Fresh bolt");
    }

    #[tokio::test]
    async fn test_fetch_gives_up_after_max_retries() {
        let storage = stub::spawn(usize::MAX).await;
        let err = client(&storage.base_url, 2)
            .fetch_items(1383, 100)
            .await
            .expect_err("every attempt fails");

        // first attempt + 2 retries
        assert_eq!(storage.calls(), 3);
        assert!(matches!(err, AppError::Upstream { status: 503, ref message } if message == "busy"));
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let api = StorageApi::new("http://storage.local:3006/", Duration::from_secs(1))
            .expect("client");
        assert_eq!(api.items_url(), "http://storage.local:3006/api/storage/all");
    }
}
