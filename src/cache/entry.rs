//! Cache Record Module
//!
//! Defines in-memory records and their persisted `{info, date?}` form.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

// == Cache Record ==
/// A single in-memory cache record.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheRecord<V> {
    /// The stored payload
    pub value: V,
    /// Insertion timestamp (Unix milliseconds), only stamped on TTL caches
    pub inserted_at: Option<u64>,
}

impl<V> CacheRecord<V> {
    // == Constructor ==
    /// Creates a record, stamping `now` when the owning cache has a TTL.
    pub fn new(value: V, ttl: Option<Duration>, now: u64) -> Self {
        Self {
            value,
            inserted_at: ttl.map(|_| now),
        }
    }

    // == Age ==
    /// Milliseconds elapsed since insertion, if stamped.
    pub fn age_ms(&self, now: u64) -> Option<u64> {
        self.inserted_at.map(|at| now.saturating_sub(at))
    }

    // == Is Expired ==
    /// Checks whether the record is older than `ttl` at time `now`.
    ///
    /// Expiry is strict: a record whose age equals `ttl` is still valid.
    /// A record without a timestamp has an unknown age and counts as expired.
    pub fn is_expired(&self, ttl: Duration, now: u64) -> bool {
        match self.age_ms(now) {
            Some(age) => u128::from(age) > ttl.as_millis(),
            None => true,
        }
    }

    // == To Stored ==
    /// Converts into the persisted layout.
    pub fn to_stored(&self) -> StoredRecord<V>
    where
        V: Clone,
    {
        StoredRecord {
            info: self.value.clone(),
            date: self.inserted_at,
        }
    }
}

// == Stored Record ==
/// Persisted layout of a record: `{ "info": ..., "date": ... }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord<V> {
    pub info: V,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<u64>,
}

impl<V> From<StoredRecord<V>> for CacheRecord<V> {
    fn from(stored: StoredRecord<V>) -> Self {
        Self {
            value: stored.info,
            inserted_at: stored.date,
        }
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TTL: Duration = Duration::from_secs(10);

    #[test]
    fn test_record_without_ttl_is_unstamped() {
        let record = CacheRecord::new("news".to_string(), None, 1_000);
        assert!(record.inserted_at.is_none());
        assert!(record.age_ms(5_000).is_none());
    }

    #[test]
    fn test_record_with_ttl_is_stamped() {
        let record = CacheRecord::new("news".to_string(), Some(TTL), 1_000);
        assert_eq!(record.inserted_at, Some(1_000));
        assert_eq!(record.age_ms(4_000), Some(3_000));
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let record = CacheRecord::new(1u8, Some(TTL), 0);

        assert!(!record.is_expired(TTL, 10_000), "age == ttl is still valid");
        assert!(record.is_expired(TTL, 10_001));
    }

    #[test]
    fn test_clock_skew_does_not_underflow() {
        let record = CacheRecord::new(1u8, Some(TTL), 50_000);
        assert_eq!(record.age_ms(10_000), Some(0));
        assert!(!record.is_expired(TTL, 10_000));
    }

    #[test]
    fn test_unstamped_record_counts_as_expired() {
        let record = CacheRecord {
            value: 1u8,
            inserted_at: None,
        };
        assert!(record.is_expired(TTL, 0));
    }

    #[test]
    fn test_stored_layout() {
        let stamped = CacheRecord::new("shopping".to_string(), Some(TTL), 42);
        assert_eq!(
            serde_json::to_value(stamped.to_stored()).unwrap(),
            json!({"info": "shopping", "date": 42})
        );

        let unstamped = CacheRecord::new("shopping".to_string(), None, 42);
        assert_eq!(
            serde_json::to_value(unstamped.to_stored()).unwrap(),
            json!({"info": "shopping"})
        );

        let parsed: StoredRecord<String> = serde_json::from_value(json!({"info": "news"})).unwrap();
        assert_eq!(CacheRecord::from(parsed).inserted_at, None);
    }

    #[test]
    fn test_current_timestamp_is_recent() {
        // 2020-01-01 in ms
        assert!(current_timestamp_ms() > 1_577_836_800_000);
    }
}
