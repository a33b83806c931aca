//! Cache Module
//!
//! Bounded, optionally TTL-aware key-value cache with FIFO eviction and a
//! write-through persistence mirror.

mod entry;
mod fifo;
mod stats;
mod store;


use std::time::Duration;

// Re-export public types
pub use entry::{current_timestamp_ms, CacheRecord, StoredRecord};
pub use fifo::FifoQueue;
pub use stats::CacheStats;
pub use store::TemporalCache;

// == Cache Config ==
/// Sizing and expiry parameters of a [`TemporalCache`].
///
/// Values are not validated; zero sizes are a caller error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheConfig {
    /// Maximum number of distinct keys held after any insert
    pub max_size: usize,
    /// Number of oldest keys dropped by one forced eviction
    pub eviction_slice_size: usize,
    /// Maximum record age; `None` disables age-based expiry
    pub ttl: Option<Duration>,
}

impl CacheConfig {
    pub fn new(max_size: usize, eviction_slice_size: usize, ttl: Option<Duration>) -> Self {
        Self {
            max_size,
            eviction_slice_size,
            ttl,
        }
    }
}

// == Cache Item ==
/// One `{key, info}` pair handed to [`TemporalCache::insert`].
#[derive(Debug, Clone, PartialEq)]
pub struct CacheItem<V> {
    pub key: String,
    pub info: V,
}

impl<V> CacheItem<V> {
    pub fn new(key: impl Into<String>, info: V) -> Self {
        Self {
            key: key.into(),
            info,
        }
    }
}
