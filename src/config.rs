//! Configuration Module
//!
//! Handles loading and managing service configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::CacheConfig;

/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Expiry sweep interval in seconds
    pub cleanup_interval: u64,
    /// Reputation cache capacity
    pub tracker_cache_max_size: usize,
    /// Reputation cache eviction slice
    pub tracker_cache_slice_size: usize,
    /// Reputation TTL in seconds
    pub tracker_cache_ttl: u64,
    /// Category cache capacity
    pub category_cache_max_size: usize,
    /// Category cache eviction slice
    pub category_cache_slice_size: usize,
    /// Durable key-value JSON file
    pub storage_path: PathBuf,
    /// IPv4 range CSV; geolocation is empty without it
    pub geo_db_path: Option<PathBuf>,
    /// Live benchmark endpoint, tried before every other source
    pub benchmarks_url: Option<String>,
    /// Benchmark bundle JSON, preferred over stored and bundled copies
    pub benchmarks_path: Option<PathBuf>,
    /// Crawl or run identifier attached to reports
    pub run_id: String,
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_path(name: &str) -> Option<PathBuf> {
    env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` (default: 3000)
    /// - `CLEANUP_INTERVAL` (default: 60)
    /// - `TRACKER_CACHE_MAX_SIZE` (default: 10000)
    /// - `TRACKER_CACHE_SLICE_SIZE` (default: 1000)
    /// - `TRACKER_CACHE_TTL` seconds (default: 604800)
    /// - `CATEGORY_CACHE_MAX_SIZE` (default: 1000000)
    /// - `CATEGORY_CACHE_SLICE_SIZE` (default: 1000)
    /// - `STORAGE_PATH` (default: `privacy_audit_store.json`)
    /// - `GEO_DB_PATH`, `BENCHMARKS_URL`, `BENCHMARKS_PATH` (default: unset)
    /// - `RUN_ID` (default: empty)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: env_or("SERVER_PORT", defaults.server_port),
            cleanup_interval: env_or("CLEANUP_INTERVAL", defaults.cleanup_interval),
            tracker_cache_max_size: env_or("TRACKER_CACHE_MAX_SIZE", defaults.tracker_cache_max_size),
            tracker_cache_slice_size: env_or(
                "TRACKER_CACHE_SLICE_SIZE",
                defaults.tracker_cache_slice_size,
            ),
            tracker_cache_ttl: env_or("TRACKER_CACHE_TTL", defaults.tracker_cache_ttl),
            category_cache_max_size: env_or(
                "CATEGORY_CACHE_MAX_SIZE",
                defaults.category_cache_max_size,
            ),
            category_cache_slice_size: env_or(
                "CATEGORY_CACHE_SLICE_SIZE",
                defaults.category_cache_slice_size,
            ),
            storage_path: env_path("STORAGE_PATH").unwrap_or(defaults.storage_path),
            geo_db_path: env_path("GEO_DB_PATH"),
            benchmarks_url: env::var("BENCHMARKS_URL").ok().filter(|v| !v.is_empty()),
            benchmarks_path: env_path("BENCHMARKS_PATH"),
            run_id: env::var("RUN_ID").unwrap_or_default(),
        }
    }

    /// Reputation cache: bounded with a TTL.
    pub fn tracker_cache_config(&self) -> CacheConfig {
        CacheConfig::new(
            self.tracker_cache_max_size,
            self.tracker_cache_slice_size,
            Some(Duration::from_secs(self.tracker_cache_ttl)),
        )
    }

    /// Category cache: bounded, never expires.
    pub fn category_cache_config(&self) -> CacheConfig {
        CacheConfig::new(self.category_cache_max_size, self.category_cache_slice_size, None)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            cleanup_interval: 60,
            tracker_cache_max_size: 10_000,
            tracker_cache_slice_size: 1_000,
            tracker_cache_ttl: 7 * 24 * 60 * 60,
            category_cache_max_size: 1_000_000,
            category_cache_slice_size: 1_000,
            storage_path: PathBuf::from("privacy_audit_store.json"),
            geo_db_path: None,
            benchmarks_url: None,
            benchmarks_path: None,
            run_id: String::new(),
        }
    }
}
