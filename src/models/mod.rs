//! Request and Response models for the audit service API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{CategoryRequest, PageRequest, ReputationsRequest};
pub use responses::{
    AppliedResponse, CacheStatsResponse, CategoryResponse, GeoResponse, HealthResponse,
    MessageResponse, ObservationResponse, PendingTrackersResponse, StatsResponse, TabResponse, TrackerResponse,
};
