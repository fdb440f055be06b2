//! In-memory cache storage

use async_trait::async_trait;
use bridge_traits::{
    cache::{CacheKey, CacheStorage},
    error::Result,
    http::HttpResponse,
};
use parking_lot::RwLock;
use std::collections::BTreeMap;

type Partition = BTreeMap<CacheKey, HttpResponse>;

/// Process-local partitioned cache
///
/// Nothing survives a restart. Used by tests and by hosts that only want the
/// interception policies without persistence.
#[derive(Default)]
pub struct MemoryCacheStorage {
    partitions: RwLock<BTreeMap<String, Partition>>,
}

impl MemoryCacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored entries across all partitions
    pub fn entry_count(&self) -> usize {
        self.partitions.read().values().map(BTreeMap::len).sum()
    }
}

#[async_trait]
impl CacheStorage for MemoryCacheStorage {
    async fn partition_names(&self) -> Result<Vec<String>> {
        Ok(self.partitions.read().keys().cloned().collect())
    }

    async fn lookup(&self, partition: &str, key: &CacheKey) -> Result<Option<HttpResponse>> {
        Ok(self
            .partitions
            .read()
            .get(partition)
            .and_then(|entries| entries.get(key))
            .cloned())
    }

    async fn put(&self, partition: &str, key: CacheKey, response: HttpResponse) -> Result<()> {
        self.partitions
            .write()
            .entry(partition.to_string())
            .or_default()
            .insert(key, response);
        Ok(())
    }

    async fn put_all(
        &self,
        partition: &str,
        entries: Vec<(CacheKey, HttpResponse)>,
    ) -> Result<()> {
        let mut partitions = self.partitions.write();
        let target = partitions.entry(partition.to_string()).or_default();
        target.extend(entries);
        Ok(())
    }

    async fn delete_partition(&self, partition: &str) -> Result<bool> {
        Ok(self.partitions.write().remove(partition).is_some())
    }

    async fn keys(&self, partition: &str) -> Result<Vec<CacheKey>> {
        Ok(self
            .partitions
            .read()
            .get(partition)
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_storage_basics() {
        let storage = MemoryCacheStorage::new();
        let key = CacheKey::get("https://cdn.example/audio/1.mp3");

        storage
            .put("media", key.clone(), HttpResponse::new(200, "bytes"))
            .await
            .unwrap();

        assert!(storage.lookup("media", &key).await.unwrap().is_some());
        assert_eq!(storage.entry_count(), 1);
        assert_eq!(storage.partition_names().await.unwrap(), vec!["media"]);

        assert!(storage.delete_partition("media").await.unwrap());
        assert_eq!(storage.entry_count(), 0);
    }
}
