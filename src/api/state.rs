//! Application State
//!
//! Everything the handlers share, and the startup sequence that restores it
//! from durable storage.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::cache::TemporalCache;
use crate::config::Config;
use crate::error::{AuditError, Result};
use crate::geo::GeoRangeIndex;
use crate::monitor::TabRegistry;
use crate::score::{BenchmarkBundle, BenchmarkSource, Policy, TrackerReputation};
use crate::storage::{
    StorageMirror, BENCHMARKS_KEY, CATEGORY_NAMESPACE, POLICY_KEY, TRACKER_NAMESPACE,
};

/// Application state shared across all handlers.
///
/// Handlers needing several locks take them in field order: `tabs`,
/// `trackers`, `categories`, `benchmarks`, `policy`.
#[derive(Clone)]
pub struct AppState {
    pub tabs: Arc<RwLock<TabRegistry>>,
    /// Tracker reputation cache (TTL)
    pub trackers: Arc<RwLock<TemporalCache<TrackerReputation>>>,
    /// Site category cache (no TTL)
    pub categories: Arc<RwLock<TemporalCache<String>>>,
    pub benchmarks: Arc<RwLock<BenchmarkBundle>>,
    pub policy: Arc<RwLock<Policy>>,
    /// Immutable after startup
    pub geo: Arc<GeoRangeIndex>,
    pub storage: StorageMirror,
    pub run_id: Arc<str>,
}

impl AppState {
    /// Creates a new AppState around already built components.
    pub fn new(
        trackers: TemporalCache<TrackerReputation>,
        categories: TemporalCache<String>,
        benchmarks: BenchmarkBundle,
        policy: Policy,
        geo: GeoRangeIndex,
        storage: StorageMirror,
        run_id: &str,
    ) -> Self {
        Self {
            tabs: Arc::new(RwLock::new(TabRegistry::new())),
            trackers: Arc::new(RwLock::new(trackers)),
            categories: Arc::new(RwLock::new(categories)),
            benchmarks: Arc::new(RwLock::new(benchmarks)),
            policy: Arc::new(RwLock::new(policy)),
            geo: Arc::new(geo),
            storage,
            run_id: Arc::from(run_id),
        }
    }

    // == Bootstrap ==
    /// Restores both caches, the policy and the benchmarks from `persisted`
    /// (a snapshot of the whole durable store) and loads the configured
    /// geolocation dataset.
    ///
    /// Benchmarks come from the live endpoint when one is configured and
    /// answers, then from the configured file, then from storage, then from
    /// the bundled copy. Fresh live or file benchmarks are persisted.
    /// A missing or unreadable geolocation dataset leaves the index empty.
    pub async fn bootstrap(
        config: &Config,
        persisted: &HashMap<String, Value>,
        storage: StorageMirror,
    ) -> Result<Self> {
        let (benchmarks, source) = BenchmarkBundle::load_with_fallback(
            config.benchmarks_url.as_deref(),
            &config.run_id,
            config.benchmarks_path.as_deref(),
            persisted.get(BENCHMARKS_KEY),
        )
        .await?;
        if matches!(source, BenchmarkSource::Remote | BenchmarkSource::File) {
            storage.set(vec![(BENCHMARKS_KEY.to_string(), bundle_value(&benchmarks)?)]);
        }

        Ok(Self::assemble(config, persisted, benchmarks, storage))
    }

    /// State with nothing persisted, nothing mirrored and the bundled
    /// benchmarks.
    pub fn in_memory(config: &Config) -> Result<Self> {
        Ok(Self::assemble(
            config,
            &HashMap::new(),
            BenchmarkBundle::bundled()?,
            StorageMirror::detached(),
        ))
    }

    fn assemble(
        config: &Config,
        persisted: &HashMap<String, Value>,
        benchmarks: BenchmarkBundle,
        storage: StorageMirror,
    ) -> Self {
        let trackers = TemporalCache::restore(
            TRACKER_NAMESPACE,
            config.tracker_cache_config(),
            storage.clone(),
            persisted,
        );
        let categories = TemporalCache::restore(
            CATEGORY_NAMESPACE,
            config.category_cache_config(),
            storage.clone(),
            persisted,
        );
        info!(
            trackers = trackers.len(),
            categories = categories.len(),
            "Caches restored"
        );

        let policy = persisted
            .get(POLICY_KEY)
            .and_then(Value::as_object)
            .map(Policy::from_flat)
            .unwrap_or_default();

        let geo = match &config.geo_db_path {
            Some(path) => GeoRangeIndex::load(path).unwrap_or_else(|e| {
                warn!(error = %e, "Geolocation unavailable, every address resolves to Unknown");
                GeoRangeIndex::default()
            }),
            None => GeoRangeIndex::default(),
        };

        Self::new(
            trackers,
            categories,
            benchmarks,
            policy,
            geo,
            storage,
            &config.run_id,
        )
    }

    /// Replaces the geolocation index.
    pub fn with_geo(mut self, geo: GeoRangeIndex) -> Self {
        self.geo = Arc::new(geo);
        self
    }
}

pub(crate) fn bundle_value(bundle: &BenchmarkBundle) -> Result<Value> {
    serde_json::to_value(bundle)
        .map_err(|e| AuditError::Internal(format!("cannot serialize benchmarks: {}", e)))
}
