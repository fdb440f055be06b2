//! Offline store configuration

use std::path::PathBuf;
use std::time::Duration;

use core_runtime::config::CoreConfig;

use crate::error::{OfflineError, Result};

const PLAYBACK_SUBDIR: &str = "playback";

/// Settings for [`OfflineStore`](crate::OfflineStore).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfflineStoreConfig {
    /// SQLite URL, `sqlite:<path>` or `sqlite::memory:`
    pub database_url: String,

    /// Directory audio blobs are materialized into for playback
    pub playback_dir: PathBuf,

    /// Upper bound on stored audio bytes; `None` keeps everything
    pub max_audio_bytes: Option<u64>,

    pub max_connections: u32,

    pub acquire_timeout: Duration,
}

impl OfflineStoreConfig {
    pub fn new(database_path: impl Into<PathBuf>, playback_dir: impl Into<PathBuf>) -> Self {
        let path = database_path.into();
        Self {
            database_url: format!("sqlite:{}", path.display()),
            playback_dir: playback_dir.into(),
            max_audio_bytes: None,
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
        }
    }

    /// An in-memory database. Every connection to `sqlite::memory:` sees its
    /// own database, so the pool is pinned to one connection.
    pub fn in_memory(playback_dir: impl Into<PathBuf>) -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            playback_dir: playback_dir.into(),
            max_audio_bytes: None,
            max_connections: 1,
            acquire_timeout: Duration::from_secs(30),
        }
    }

    pub fn from_core(config: &CoreConfig) -> Self {
        Self::new(config.database_path.clone(), config.cache_dir.join(PLAYBACK_SUBDIR))
            .with_max_audio_bytes(config.max_audio_bytes)
    }

    pub fn with_max_audio_bytes(mut self, budget: Option<u64>) -> Self {
        self.max_audio_bytes = budget;
        self
    }

    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_url.contains(":memory:")
    }

    pub fn validate(&self) -> Result<()> {
        if !self.database_url.starts_with("sqlite:") {
            return Err(OfflineError::InvalidConfig(format!(
                "unsupported database url: {}",
                self.database_url
            )));
        }

        if self.max_connections == 0 {
            return Err(OfflineError::InvalidConfig(
                "max_connections must be at least 1".to_string(),
            ));
        }

        if self.is_in_memory() && self.max_connections != 1 {
            return Err(OfflineError::InvalidConfig(
                "in-memory databases require a single connection".to_string(),
            ));
        }

        if self.max_audio_bytes == Some(0) {
            return Err(OfflineError::InvalidConfig(
                "max_audio_bytes must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_config() {
        let config = OfflineStoreConfig::new("/tmp/tilawa/offline.db", "/tmp/tilawa/playback");
        assert_eq!(config.database_url, "sqlite:/tmp/tilawa/offline.db");
        assert!(!config.is_in_memory());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_in_memory_needs_single_connection() {
        let config = OfflineStoreConfig::in_memory("/tmp/playback");
        assert!(config.validate().is_ok());
        assert!(config.with_max_connections(4).validate().is_err());
    }

    #[test]
    fn test_zero_budget_rejected() {
        let config = OfflineStoreConfig::in_memory("/tmp/playback").with_max_audio_bytes(Some(0));
        assert!(matches!(
            config.validate(),
            Err(OfflineError::InvalidConfig(_))
        ));
    }
}
