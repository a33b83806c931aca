//! Score Module
//!
//! Statistical scoring of page snapshots against population benchmarks.

pub mod benchmark;
pub mod classify;
pub mod engine;
pub mod level;
pub mod policy;
pub mod report;
pub mod snapshot;
pub mod widgets;

pub use benchmark::{BenchmarkBundle, BenchmarkSource, BenchmarkStat, CategoryBenchmarks};
pub use classify::{quartile, sigma, threshold, EngineKind};
pub use engine::ScoreEngine;
pub use level::SeverityLevel;
pub use policy::{Policy, WidgetPolicy};
pub use report::{CategoryReport, ClassificationReport, Plot, Problem, WidgetReport, WidgetReports};
pub use snapshot::{
    FormMethod, FormObservation, IframeObservation, InclusionKind, MixedInclusion, PageSnapshot,
    Protocol, TrackerObservation, TrackerReputation, DEFAULT_CATEGORY, UNKNOWN_ACTION,
};
