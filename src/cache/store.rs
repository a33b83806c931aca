//! Temporal Cache Module
//!
//! Main cache engine combining HashMap storage with FIFO tracking, optional
//! TTL expiry and write-through persistence.

use std::collections::{HashMap, HashSet};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::cache::{
    current_timestamp_ms, CacheConfig, CacheItem, CacheRecord, CacheStats, FifoQueue,
    StoredRecord,
};
use crate::storage::StorageMirror;

// == Temporal Cache ==
/// Bounded key -> value cache evicting by age of first insertion.
#[derive(Debug)]
pub struct TemporalCache<V> {
    /// Prefix applied to keys in the shared durable namespace
    namespace: String,
    /// Key-value storage
    records: HashMap<String, CacheRecord<V>>,
    /// First-insertion order
    fifo: FifoQueue,
    config: CacheConfig,
    stats: CacheStats,
    mirror: StorageMirror,
}

impl<V> TemporalCache<V>
where
    V: Clone + Serialize,
{
    // == Constructor ==
    /// Creates an empty cache mirroring into `namespace` of the durable store.
    pub fn new(namespace: impl Into<String>, config: CacheConfig, mirror: StorageMirror) -> Self {
        Self {
            namespace: namespace.into(),
            records: HashMap::new(),
            fifo: FifoQueue::new(),
            config,
            stats: CacheStats::new(),
            mirror,
        }
    }

    // == Restore ==
    /// Rebuilds a cache from a snapshot of the whole durable store.
    ///
    /// Only keys under this cache's namespace are taken. FIFO order is
    /// reconstructed ascending by insertion date, ties and undated records
    /// ordered by key. Records that do not deserialize are skipped.
    pub fn restore(
        namespace: impl Into<String>,
        config: CacheConfig,
        mirror: StorageMirror,
        persisted: &HashMap<String, Value>,
    ) -> Self
    where
        V: DeserializeOwned,
    {
        let mut cache = Self::new(namespace, config, mirror);

        let mut loaded: Vec<(String, CacheRecord<V>)> = persisted
            .iter()
            .filter_map(|(full_key, raw)| {
                let key = full_key.strip_prefix(cache.namespace.as_str())?;
                match serde_json::from_value::<StoredRecord<V>>(raw.clone()) {
                    Ok(stored) => Some((key.to_string(), CacheRecord::from(stored))),
                    Err(e) => {
                        debug!(key = %full_key, error = %e, "Skipping unreadable cache record");
                        None
                    }
                }
            })
            .collect();

        loaded.sort_by(|(ka, a), (kb, b)| a.inserted_at.cmp(&b.inserted_at).then_with(|| ka.cmp(kb)));

        cache.fifo = loaded.iter().map(|(key, _)| key.clone()).collect();
        cache.records = loaded.into_iter().collect();
        cache.stats.set_total_entries(cache.records.len());
        cache
    }

    // == Insert ==
    /// Upserts `items`, stamping them with the current time on TTL caches.
    pub fn insert(&mut self, items: Vec<CacheItem<V>>) {
        self.insert_at(items, current_timestamp_ms());
    }

    /// [`insert`](Self::insert) with an explicit clock reading.
    ///
    /// When the distinct key count would exceed `max_size`, the oldest slice
    /// is force-evicted first (repeatedly, if one slice is not enough).
    /// Re-inserted keys keep their FIFO position.
    pub fn insert_at(&mut self, items: Vec<CacheItem<V>>, now: u64) {
        if items.is_empty() {
            return;
        }

        {
            let batch_keys: HashSet<&str> = items.iter().map(|item| item.key.as_str()).collect();
            loop {
                let new_keys = batch_keys
                    .iter()
                    .filter(|key| !self.records.contains_key(**key))
                    .count();
                if self.records.len() + new_keys <= self.config.max_size || self.fifo.is_empty() {
                    break;
                }
                if self.free_at(true, now) == 0 {
                    break;
                }
            }
        }

        let mut to_store: HashMap<String, Value> = HashMap::new();
        for CacheItem { key, info } in items {
            let record = CacheRecord::new(info, self.config.ttl, now);
            if let Ok(json) = serde_json::to_value(record.to_stored()) {
                to_store.insert(self.storage_key(&key), json);
            }
            if !self.records.contains_key(&key) {
                self.fifo.push_back(key.clone());
            }
            self.records.insert(key, record);
        }
        self.mirror.set(to_store.into_iter().collect());

        // A batch larger than the whole cache still may not overflow it
        let mut overflow = Vec::new();
        while self.records.len() > self.config.max_size {
            match self.fifo.pop_front() {
                Some(key) => {
                    if self.records.remove(&key).is_some() {
                        self.stats.record_eviction();
                    }
                    overflow.push(self.storage_key(&key));
                }
                None => break,
            }
        }
        self.mirror.remove(overflow);

        self.stats.set_total_entries(self.records.len());
    }

    // == Search ==
    /// Looks up `key`, hiding records older than the TTL.
    pub fn search(&mut self, key: &str) -> Option<V> {
        self.search_at(key, current_timestamp_ms())
    }

    /// [`search`](Self::search) with an explicit clock reading.
    ///
    /// Finding an expired record triggers a lazy [`free`](Self::free) sweep
    /// from the FIFO head. The sweep stops at the first valid record, so the
    /// expired record itself may survive physically until a later sweep.
    pub fn search_at(&mut self, key: &str, now: u64) -> Option<V> {
        let expired = match self.records.get(key) {
            None => {
                self.stats.record_miss();
                return None;
            }
            Some(record) => match self.config.ttl {
                Some(ttl) => record.is_expired(ttl, now),
                None => false,
            },
        };

        if expired {
            self.stats.record_miss();
            self.free_at(false, now);
            return None;
        }

        self.stats.record_hit();
        self.records.get(key).map(|record| record.value.clone())
    }

    // == Free ==
    /// Releases space, returning the number of records removed.
    pub fn free(&mut self, forced: bool) -> usize {
        self.free_at(forced, current_timestamp_ms())
    }

    /// [`free`](Self::free) with an explicit clock reading.
    ///
    /// - `forced`: drops the oldest `eviction_slice_size` keys, then keeps
    ///   sweeping expired ones.
    /// - not forced: drops the oldest keys while they are expired.
    ///
    /// Sweeps stop at the first unexpired record. Without a TTL nothing
    /// expires, so only the forced slice is removed.
    pub fn free_at(&mut self, forced: bool, now: u64) -> usize {
        let mut removed = Vec::new();

        if forced {
            for _ in 0..self.config.eviction_slice_size {
                let Some(key) = self.fifo.pop_front() else {
                    break;
                };
                if self.records.remove(&key).is_some() {
                    self.stats.record_eviction();
                }
                removed.push(key);
            }
        }

        if let Some(ttl) = self.config.ttl {
            while let Some(key) = self.fifo.peek_front() {
                let expired = self
                    .records
                    .get(key)
                    .map_or(true, |record| record.is_expired(ttl, now));
                if !expired {
                    break;
                }
                if let Some(key) = self.fifo.pop_front() {
                    if self.records.remove(&key).is_some() {
                        self.stats.record_expiration();
                    }
                    removed.push(key);
                }
            }
        }

        let count = removed.len();
        if count > 0 {
            debug!(namespace = %self.namespace, removed = count, forced, "Cache records freed");
        }
        let storage_keys = removed.iter().map(|key| self.storage_key(key)).collect();
        self.mirror.remove(storage_keys);
        self.stats.set_total_entries(self.records.len());
        count
    }

    // == Accessors ==
    /// Number of physically present records (expired-but-unswept included).
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Physical presence, regardless of expiry.
    pub fn contains_key(&self, key: &str) -> bool {
        self.records.contains_key(key)
    }

    /// Keys from oldest to newest insertion.
    pub fn keys_in_order(&self) -> Vec<&str> {
        self.fifo.iter().map(String::as_str).collect()
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.records.len());
        stats
    }

    fn storage_key(&self, key: &str) -> String {
        format!("{}{}", self.namespace, key)
    }
}
