//! Key-Value Store Module
//!
//! Backends for the flat `key -> json` namespace.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::error::StorageError;

// == Storage Operation ==
/// A single write-through operation against the flat store.
#[derive(Debug, Clone, PartialEq)]
pub enum StorageOp {
    /// Upsert every `(key, value)` pair
    Set(Vec<(String, Value)>),
    /// Delete every listed key (missing keys are ignored)
    Remove(Vec<String>),
}

// == KvStore Trait ==
/// A durable flat key-value store.
pub trait KvStore: Send + 'static {
    /// Returns every stored pair.
    fn load_all(&self) -> Result<HashMap<String, Value>, StorageError>;

    /// Applies one operation.
    fn apply(&mut self, op: StorageOp) -> Result<(), StorageError>;

    /// Applies `ops` in order. Backends with an expensive commit override
    /// this to commit once per batch.
    fn apply_batch(&mut self, ops: Vec<StorageOp>) -> Result<(), StorageError> {
        for op in ops {
            self.apply(op)?;
        }
        Ok(())
    }
}

// == Memory Store ==
/// Volatile store, used in tests and when no storage path is configured.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    data: HashMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl KvStore for MemoryStore {
    fn load_all(&self) -> Result<HashMap<String, Value>, StorageError> {
        Ok(self.data.clone())
    }

    fn apply(&mut self, op: StorageOp) -> Result<(), StorageError> {
        apply_to_map(&mut self.data, op);
        Ok(())
    }
}

// == JSON File Store ==
/// Store persisted as a single JSON object, rewritten after each operation
/// or batch. Every call blocks on file I/O.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    data: HashMap<String, Value>,
}

impl JsonFileStore {
    /// Opens the store at `path`, reading existing contents if the file exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let data = if path.exists() {
            let text = fs::read_to_string(&path)?;
            if text.trim().is_empty() {
                HashMap::new()
            } else {
                let map: Map<String, Value> = serde_json::from_str(&text)?;
                map.into_iter().collect()
            }
        } else {
            HashMap::new()
        };

        Ok(Self { path, data })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), StorageError> {
        // BTreeMap gives a stable file layout between rewrites
        let ordered: std::collections::BTreeMap<&String, &Value> = self.data.iter().collect();
        let text = serde_json::to_string(&ordered)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, text)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KvStore for JsonFileStore {
    fn load_all(&self) -> Result<HashMap<String, Value>, StorageError> {
        Ok(self.data.clone())
    }

    fn apply(&mut self, op: StorageOp) -> Result<(), StorageError> {
        apply_to_map(&mut self.data, op);
        self.flush()
    }

    fn apply_batch(&mut self, ops: Vec<StorageOp>) -> Result<(), StorageError> {
        for op in ops {
            apply_to_map(&mut self.data, op);
        }
        self.flush()
    }
}

fn apply_to_map(data: &mut HashMap<String, Value>, op: StorageOp) {
    match op {
        StorageOp::Set(pairs) => {
            for (key, value) in pairs {
                data.insert(key, value);
            }
        }
        StorageOp::Remove(keys) => {
            for key in keys {
                data.remove(&key);
            }
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn temp_path(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!(
            "privacy_audit_{}_{}_{}.json",
            name,
            std::process::id(),
            chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ));
        path
    }

    #[test]
    fn test_memory_store_set_and_remove() {
        let mut store = MemoryStore::new();

        store
            .apply(StorageOp::Set(vec![
                ("a".to_string(), json!(1)),
                ("b".to_string(), json!({"info": "news"})),
            ]))
            .unwrap();
        assert_eq!(store.len(), 2);

        store
            .apply(StorageOp::Remove(vec!["a".to_string(), "missing".to_string()]))
            .unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("b"), Some(&json!({"info": "news"})));
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let path = temp_path("reopen");

        {
            let mut store = JsonFileStore::open(&path).unwrap();
            store
                .apply(StorageOp::Set(vec![(
                    "tracker:example.com".to_string(),
                    json!({"info": {"domain": "example.com"}, "date": 5}),
                )]))
                .unwrap();
        }

        let reopened = JsonFileStore::open(&path).unwrap();
        let all = reopened.load_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all["tracker:example.com"]["date"], json!(5));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_file_store_remove_survives_reopen() {
        let path = temp_path("remove");

        {
            let mut store = JsonFileStore::open(&path).unwrap();
            store
                .apply(StorageOp::Set(vec![
                    ("category:a.com".to_string(), json!({"info": "news"})),
                    ("category:b.com".to_string(), json!({"info": "shopping"})),
                ]))
                .unwrap();
        }

        {
            let mut store = JsonFileStore::open(&path).unwrap();
            store
                .apply(StorageOp::Remove(vec!["category:a.com".to_string()]))
                .unwrap();
        }

        let all = JsonFileStore::open(&path).unwrap().load_all().unwrap();
        assert_eq!(all.len(), 1);
        assert!(!all.contains_key("category:a.com"));
        assert_eq!(all["category:b.com"], json!({"info": "shopping"}));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_file_store_batch_applies_in_order() {
        let path = temp_path("batch");

        {
            let mut store = JsonFileStore::open(&path).unwrap();
            store
                .apply_batch(vec![
                    StorageOp::Set(vec![("k".to_string(), json!(1)), ("gone".to_string(), json!(2))]),
                    StorageOp::Remove(vec!["gone".to_string()]),
                    StorageOp::Set(vec![("k".to_string(), json!(3))]),
                ])
                .unwrap();
        }

        let all = JsonFileStore::open(&path).unwrap().load_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all["k"], json!(3));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_file_store_missing_file_is_empty() {
        let path = temp_path("missing");
        let store = JsonFileStore::open(&path).unwrap();
        assert!(store.load_all().unwrap().is_empty());
        assert!(!path.exists());
    }

    #[test]
    fn test_file_store_rejects_garbage() {
        let path = temp_path("garbage");
        fs::write(&path, "not json").unwrap();

        let result = JsonFileStore::open(&path);
        assert!(matches!(result, Err(StorageError::Serde(_))));

        let _ = fs::remove_file(&path);
    }
}
