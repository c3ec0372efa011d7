// =============================================================================
// CACHE MODULE
// =============================================================================
// Redis cache of normalized item batches, one key per warehouse.
//
// The cache is an optimization only. A failed or garbled read counts as a
// miss and a failed write is logged; neither fails the request. A refresh
// overwrites the key only once a new batch is in hand, so the previous batch
// keeps being served while the storage API is failing.
// =============================================================================

use std::time::Instant;

use redis::aio::ConnectionManager;

use crate::metrics;
use crate::models::Item;

#[derive(Clone)]
pub struct ItemCache {
    redis: ConnectionManager,
    /// How long a batch stays fresh
    ttl_secs: u64,
}

/// Redis key holding the batch of `warehouse`.
pub fn cache_key(warehouse: i64) -> String {
    format!("storage:items:{}", warehouse)
}

impl ItemCache {
    pub fn new(redis: ConnectionManager, ttl_secs: u64) -> Self {
        Self { redis, ttl_secs }
    }

    /// Cached batch of `warehouse`, if present and readable.
    pub async fn get(&self, warehouse: i64) -> Option<Vec<Item>> {
        let start = Instant::now();
        let cached: Option<String> = redis::cmd("GET")
            .arg(cache_key(warehouse))
            .query_async(&mut self.redis.clone())
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(warehouse, error = %e, "Cache read failed");
                None
            });
        metrics::record_redis_operation("get", start.elapsed().as_secs_f64());

        decode_batch(warehouse, cached?)
    }

    /// Store the batch of `warehouse` for `ttl_secs`.
    pub async fn put(&self, warehouse: i64, items: &[Item]) {
        let json = match serde_json::to_string(items) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(warehouse, error = %e, "Could not serialize batch for cache");
                return;
            }
        };

        let start = Instant::now();
        let result: redis::RedisResult<()> = redis::cmd("SETEX")
            .arg(cache_key(warehouse))
            .arg(self.ttl_secs)
            .arg(json)
            .query_async(&mut self.redis.clone())
            .await;
        metrics::record_redis_operation("set", start.elapsed().as_secs_f64());

        if let Err(e) = result {
            tracing::warn!(warehouse, error = %e, "Cache write failed");
        }
    }

    pub async fn ping(&self) -> bool {
        redis::cmd("PING")
            .query_async::<_, String>(&mut self.redis.clone())
            .await
            .is_ok()
    }
}

fn decode_batch(warehouse: i64, json: String) -> Option<Vec<Item>> {
    match serde_json::from_str(&json) {
        Ok(items) => Some(items),
        Err(e) => {
            tracing::warn!(warehouse, error = %e, "Discarding unreadable cached batch");
            None
        }
    }
}

/// Cache on the Redis at `REDIS_URL` (default `redis://127.0.0.1:6379`),
/// or `None` when no server answers.
#[cfg(test)]
pub(crate) async fn local_cache() -> Option<ItemCache> {
    let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
    let client = redis::Client::open(url).ok()?;
    let connect = ConnectionManager::new(client);
    let redis = tokio::time::timeout(std::time::Duration::from_secs(2), connect)
        .await
        .ok()?
        .ok()?;
    Some(ItemCache::new(redis, 60))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_per_warehouse() {
        assert_eq!(cache_key(1383), "storage:items:1383");
        assert_ne!(cache_key(1), cache_key(2));
    }

    #[test]
    fn test_garbled_payload_is_a_miss() {
        assert!(decode_batch(1, "not json".to_string()).is_none());
        assert!(decode_batch(1, r#"{"items": []}"#.to_string()).is_none());

        let item = Item {
            name: "Bolt".to_string(),
            ..Item::default()
        };
        let json = serde_json::to_string(&[&item]).expect("serialize");
        assert_eq!(decode_batch(1, json), Some(vec![item]));
    }

    // Needs a Redis server; skipped when none is reachable.
    #[tokio::test]
    async fn test_round_trip_and_garbled_key() {
        let Some(cache) = local_cache().await else {
            eprintln!("redis not reachable, skipping");
            return;
        };
        let warehouse = 990_101;

        let items = vec![Item {
            name: "Bolt".to_string(),
            ..Item::default()
        }];
        cache.put(warehouse, &items).await;
        assert_eq!(cache.get(warehouse).await, Some(items));

        redis::cmd("SET")
            .arg(cache_key(warehouse))
            .arg("{broken")
            .query_async::<_, ()>(&mut cache.redis.clone())
            .await
            .expect("overwrite key");
        assert_eq!(cache.get(warehouse).await, None);
    }
}
