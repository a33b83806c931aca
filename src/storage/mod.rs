//! Storage Module
//!
//! Flat key-value persistence shared by the caches and the benchmark snapshot.
//! Writes are fire-and-forget: callers hand operations to a [`StorageMirror`]
//! and a background writer applies them in order.

mod kv;
mod mirror;

pub use kv::{JsonFileStore, KvStore, MemoryStore, StorageOp};
pub use mirror::{spawn_storage_writer, StorageMirror};

// == Key Namespaces ==
/// Prefix for tracker reputation records.
pub const TRACKER_NAMESPACE: &str = "tracker:";

/// Prefix for site category records.
pub const CATEGORY_NAMESPACE: &str = "category:";

/// Key holding the last benchmark bundle that was loaded successfully.
pub const BENCHMARKS_KEY: &str = "benchmarks";

/// Key holding the user policy as its flat options map.
pub const POLICY_KEY: &str = "policy";
