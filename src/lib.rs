//! Privacy Audit - page privacy scoring service
//!
//! Scores visited pages against population benchmarks, backed by a persistent
//! FIFO/TTL cache for tracker reputation and site categories and by an IPv4
//! geolocation index.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod geo;
pub mod models;
pub mod monitor;
pub mod score;
pub mod storage;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use tasks::spawn_cleanup_task;
