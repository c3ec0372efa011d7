// =============================================================================
// CONFIGURATION MODULE
// =============================================================================
// Loads configuration from environment variables.
//
// LEARNING NOTES:
// - Optional settings fall back to the dashboard's usual values
// - Parse errors are reported at startup, never mid-request
// =============================================================================

use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::models::DEFAULT_WAREHOUSE;

#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port (default: 8003)
    pub port: u16,

    /// Base URL of the storage API
    /// Format: http://host:port
    pub storage_api_url: String,

    /// Redis connection URL
    /// Format: redis://:password@host:port/db_number
    pub redis_url: String,

    /// Warehouse served when a request doesn't name one (default: 1383)
    pub default_warehouse: i64,

    /// `limit` sent to the storage API (default: 100000)
    pub fetch_limit: u32,

    /// Storage API request timeout (default: 10s)
    pub request_timeout: Duration,

    /// How long a cached batch stays fresh, in seconds (default: 300)
    pub cache_ttl_secs: u64,

    /// Background refresh period of the default warehouse (default: 300s)
    pub refresh_interval: Duration,
}

/// Read `name`, falling back to `default` when unset, and parse it.
fn var_or<T>(name: &str, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .with_context(|| format!("Failed to parse {}", name))
}

impl Config {
    /// Creates a Config by reading environment variables.
    ///
    /// `STORAGE_API_URL` and `REDIS_URL` are required; everything else has a
    /// default.
    pub fn from_env() -> Result<Self> {
        let default_warehouse = DEFAULT_WAREHOUSE.to_string();

        let refresh_secs: u64 = var_or("REFRESH_INTERVAL_SECS", "300")?;
        anyhow::ensure!(refresh_secs > 0, "REFRESH_INTERVAL_SECS must be greater than zero");

        Ok(Self {
            port: var_or("PORT", "8003")?,

            storage_api_url: env::var("STORAGE_API_URL")
                .context("STORAGE_API_URL environment variable is required")?,

            redis_url: env::var("REDIS_URL")
                .context("REDIS_URL environment variable is required")?,

            default_warehouse: var_or("DEFAULT_WAREHOUSE", &default_warehouse)?,
            fetch_limit: var_or("FETCH_LIMIT", "100000")?,
            request_timeout: Duration::from_secs(var_or("REQUEST_TIMEOUT_SECS", "10")?),
            cache_ttl_secs: var_or("CACHE_TTL_SECS", "300")?,
            refresh_interval: Duration::from_secs(refresh_secs),
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
// Both tests touch process-wide env vars, so they share one lock.
#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const VARS: [&str; 8] = [
        "PORT",
        "STORAGE_API_URL",
        "REDIS_URL",
        "DEFAULT_WAREHOUSE",
        "FETCH_LIMIT",
        "REQUEST_TIMEOUT_SECS",
        "CACHE_TTL_SECS",
        "REFRESH_INTERVAL_SECS",
    ];

    fn clear() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_config_from_env() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear();

        env::set_var("PORT", "9000");
        env::set_var("STORAGE_API_URL", "http://storage.local:3006");
        env::set_var("REDIS_URL", "redis://localhost:6379");
        env::set_var("DEFAULT_WAREHOUSE", "77");
        env::set_var("CACHE_TTL_SECS", "60");

        let config = Config::from_env().expect("Failed to load config");

        assert_eq!(config.port, 9000);
        assert_eq!(config.storage_api_url, "http://storage.local:3006");
        assert!(config.redis_url.contains("redis://"));
        assert_eq!(config.default_warehouse, 77);
        assert_eq!(config.fetch_limit, 100_000);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.cache_ttl_secs, 60);
        assert_eq!(config.refresh_interval, Duration::from_secs(300));

        clear();
    }

    #[test]
    fn test_missing_and_invalid_values() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear();

        env::set_var("REDIS_URL", "redis://localhost:6379");
        assert!(Config::from_env().is_err());

        env::set_var("STORAGE_API_URL", "http://storage.local:3006");
        env::set_var("FETCH_LIMIT", "lots");
        let err = Config::from_env().expect_err("bad limit");
        assert!(err.to_string().contains("FETCH_LIMIT"));

        env::remove_var("FETCH_LIMIT");
        env::set_var("REFRESH_INTERVAL_SECS", "0");
        assert!(Config::from_env().is_err());

        clear();
    }
}
