//! In-memory store backend (default, thread-safe, async).
//!
//! Uses DashMap for lock-free concurrent access with per-key sharding.

use super::StoreBackend;
use crate::error::Result;
use dashmap::DashMap;
use std::sync::Arc;

/// Thread-safe async in-memory store.
///
/// Clones share the same map, so a directory and a bill store built from
/// clones of one `InMemoryStore` see each other's writes.
///
/// # Example
///
/// ```no_run
/// use bill_kit::backend::{InMemoryStore, StoreBackend};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = InMemoryStore::new();
///
///     store.set("customer:9876543210", b"record".to_vec()).await?;
///     assert!(store.get("customer:9876543210").await?.is_some());
///
///     Ok(())
/// }
/// ```
#[derive(Clone, Default)]
pub struct InMemoryStore {
    entries: Arc<DashMap<String, Vec<u8>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        InMemoryStore {
            entries: Arc::new(DashMap::new()),
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub async fn stats(&self) -> StoreStats {
        let total_bytes: usize = self.entries.iter().map(|entry| entry.value().len()).sum();

        StoreStats {
            total_entries: self.entries.len(),
            total_bytes,
        }
    }

    /// Print store statistics to debug log.
    pub async fn log_stats(&self) {
        let stats = self.stats().await;
        debug!(
            "Store stats: {} entries, {} bytes",
            stats.total_entries, stats.total_bytes
        );
    }
}

impl StoreBackend for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let value = self.entries.get(key).map(|entry| entry.value().clone());
        debug!(
            "InMemory GET {} -> {}",
            key,
            if value.is_some() { "HIT" } else { "MISS" }
        );
        Ok(value)
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<()> {
        self.entries.insert(key.to_string(), value);
        debug!("InMemory SET {}", key);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.remove(key);
        debug!("InMemory DELETE {}", key);
        Ok(())
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .entries
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| entry.key().clone())
            .collect())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.entries.contains_key(key))
    }

    async fn clear_all(&self) -> Result<()> {
        self.entries.clear();
        warn!("InMemory CLEAR_ALL executed - all records removed");
        Ok(())
    }
}

/// Store statistics.
#[derive(Clone, Debug)]
pub struct StoreStats {
    pub total_entries: usize,
    pub total_bytes: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_inmemory_set_get() {
        let store = InMemoryStore::new();

        store
            .set("key1", b"value1".to_vec())
            .await
            .expect("Failed to set");

        let result = store.get("key1").await.expect("Failed to get");
        assert_eq!(result, Some(b"value1".to_vec()));
    }

    #[tokio::test]
    async fn test_inmemory_miss() {
        let store = InMemoryStore::new();

        let result = store.get("nonexistent").await.expect("Failed to get");
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_inmemory_delete() {
        let store = InMemoryStore::new();

        store
            .set("key1", b"value1".to_vec())
            .await
            .expect("Failed to set");
        store.delete("key1").await.expect("Failed to delete");

        assert!(!store.exists("key1").await.expect("Failed to check exists"));
    }

    #[tokio::test]
    async fn test_inmemory_keys_with_prefix() {
        let store = InMemoryStore::new();
        store.set("bill:1", vec![1]).await.unwrap();
        store.set("bill:2", vec![2]).await.unwrap();
        store.set("customer:1", vec![3]).await.unwrap();

        let mut keys = store.keys_with_prefix("bill:").await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["bill:1".to_string(), "bill:2".to_string()]);
    }

    #[tokio::test]
    async fn test_inmemory_clear_all() {
        let store = InMemoryStore::new();
        store.set("key1", b"value1".to_vec()).await.unwrap();
        store.set("key2", b"value2".to_vec()).await.unwrap();

        assert_eq!(store.len().await, 2);
        store.clear_all().await.expect("Failed to clear");
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_inmemory_stats() {
        let store = InMemoryStore::new();
        store.set("key1", b"value_with_data".to_vec()).await.unwrap();
        store.set("key2", b"data".to_vec()).await.unwrap();

        let stats = store.stats().await;
        assert_eq!(stats.total_entries, 2);
        assert_eq!(stats.total_bytes, 19);
    }

    #[tokio::test]
    async fn test_inmemory_clones_share_entries() {
        let store1 = InMemoryStore::new();
        store1.set("key", b"value".to_vec()).await.unwrap();

        let store2 = store1.clone();
        assert_eq!(
            store2.get("key").await.unwrap(),
            Some(b"value".to_vec())
        );
    }

    #[tokio::test]
    async fn test_inmemory_thread_safe() {
        let store = InMemoryStore::new();
        let mut handles = vec![];

        for i in 0..10 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let key = format!("key_{}", i);
                store
                    .set(&key, format!("value_{}", i).into_bytes())
                    .await
                    .expect("Failed to set");
            }));
        }

        for handle in handles {
            handle.await.expect("Task failed");
        }

        assert_eq!(store.len().await, 10);
    }
}
