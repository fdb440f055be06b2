//! Storage estimation from on-disk directory sizes

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    quota::{StorageEstimate, StorageEstimator},
};
use std::path::PathBuf;
use tracing::debug;

/// Default quota when the host does not configure one (2 GiB)
pub const DEFAULT_QUOTA_BYTES: u64 = 2 * 1024 * 1024 * 1024;

/// Reports the combined size of a set of directories/files against a fixed quota
#[derive(Debug, Clone)]
pub struct DirectoryStorageEstimator {
    roots: Vec<PathBuf>,
    quota_bytes: u64,
}

impl DirectoryStorageEstimator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            roots: vec![root.into()],
            quota_bytes: DEFAULT_QUOTA_BYTES,
        }
    }

    /// Include another directory or file in the usage total
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.roots.push(root.into());
        self
    }

    pub fn with_quota(mut self, quota_bytes: u64) -> Self {
        self.quota_bytes = quota_bytes;
        self
    }

    async fn path_size(root: PathBuf) -> Result<u64> {
        let mut total = 0u64;
        let mut pending = vec![root];

        while let Some(path) = pending.pop() {
            let metadata = match tokio::fs::metadata(&path).await {
                Ok(metadata) => metadata,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(BridgeError::Io(e)),
            };

            if metadata.is_dir() {
                let mut entries = tokio::fs::read_dir(&path).await?;
                while let Some(entry) = entries.next_entry().await? {
                    pending.push(entry.path());
                }
            } else {
                total += metadata.len();
            }
        }

        Ok(total)
    }
}

#[async_trait]
impl StorageEstimator for DirectoryStorageEstimator {
    async fn estimate(&self) -> Result<StorageEstimate> {
        let mut usage = 0u64;
        for root in &self.roots {
            usage += Self::path_size(root.clone()).await?;
        }

        debug!(usage_bytes = usage, quota_bytes = self.quota_bytes, "Estimated storage usage");
        Ok(StorageEstimate::new(usage, self.quota_bytes))
    }
}
