//! Storage Quota Abstraction

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Bytes used and bytes available to the application's local storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StorageEstimate {
    pub usage_bytes: u64,
    pub quota_bytes: u64,
}

impl StorageEstimate {
    pub fn new(usage_bytes: u64, quota_bytes: u64) -> Self {
        Self {
            usage_bytes,
            quota_bytes,
        }
    }

    /// Zero usage and zero quota; reported when no estimate is available.
    pub fn unknown() -> Self {
        Self::default()
    }

    pub fn remaining_bytes(&self) -> u64 {
        self.quota_bytes.saturating_sub(self.usage_bytes)
    }

    /// Usage as a percentage of quota, 0.0 when the quota is unknown.
    pub fn usage_percent(&self) -> f64 {
        if self.quota_bytes == 0 {
            return 0.0;
        }
        (self.usage_bytes as f64 / self.quota_bytes as f64) * 100.0
    }
}

/// Storage quota estimator
///
/// Mirrors the browser's `navigator.storage.estimate()`; hosts without a
/// quota concept can report usage against a configured ceiling.
#[async_trait::async_trait]
pub trait StorageEstimator: Send + Sync {
    async fn estimate(&self) -> Result<StorageEstimate>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_math() {
        let estimate = StorageEstimate::new(250, 1000);
        assert_eq!(estimate.remaining_bytes(), 750);
        assert!((estimate.usage_percent() - 25.0).abs() < f64::EPSILON);

        let unknown = StorageEstimate::unknown();
        assert_eq!(unknown.remaining_bytes(), 0);
        assert_eq!(unknown.usage_percent(), 0.0);
    }
}
