//! Response DTOs for the audit service API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::CacheStats;
use crate::monitor::TabId;
use crate::score::{TrackerObservation, TrackerReputation};

/// Response body for `GET /geo/:ip`
#[derive(Debug, Clone, Serialize)]
pub struct GeoResponse {
    pub ip: String,
    pub country: String,
}

/// Response body for `GET /trackers/:domain`
#[derive(Debug, Clone, Serialize)]
pub struct TrackerResponse {
    pub domain: String,
    pub reputation: TrackerReputation,
}

/// Response body for `GET /categories/:domain`
#[derive(Debug, Clone, Serialize)]
pub struct CategoryResponse {
    pub domain: String,
    pub category: String,
}

/// Response body for page registration and navigation
#[derive(Debug, Clone, Serialize)]
pub struct TabResponse {
    pub tab: TabId,
    pub url: String,
    pub site: String,
}

/// Response body for `GET /tabs/:tab/pending-trackers`
#[derive(Debug, Clone, Serialize)]
pub struct PendingTrackersResponse {
    pub tab: TabId,
    pub run_id: String,
    pub trackers: Vec<TrackerObservation>,
}

/// Response body for bulk cache writes
#[derive(Debug, Clone, Serialize)]
pub struct AppliedResponse {
    pub applied: usize,
}

/// Generic acknowledgement
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Acknowledgement of an observation
#[derive(Debug, Clone, Serialize)]
pub struct ObservationResponse {
    pub message: String,
    /// Positions of the reported forms to highlight as leaky
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub mark_forms: Vec<usize>,
}

/// Statistics of one cache, with its hit rate
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatsResponse {
    #[serde(flatten)]
    pub stats: CacheStats,
    pub hit_rate: f64,
}

impl From<CacheStats> for CacheStatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            stats,
        }
    }
}

/// Response body for `GET /stats`
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub trackers: CacheStatsResponse,
    pub categories: CacheStatsResponse,
    pub tabs: usize,
    pub geo_ranges: usize,
    pub benchmark_categories: usize,
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
