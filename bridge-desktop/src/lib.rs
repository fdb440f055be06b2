//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `HttpClient` using `reqwest`
//! - `CacheStorage` using SQLite (`SqliteCacheStorage`) or memory (`MemoryCacheStorage`)
//! - `NetworkMonitor` using a periodic reachability probe
//! - `StorageEstimator` summing on-disk sizes against a configured quota
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{default_data_dir, ReqwestHttpClient, SqliteCacheStorage};
//!
//! #[tokio::main]
//! async fn main() -> bridge_traits::Result<()> {
//!     let http_client = ReqwestHttpClient::new()?;
//!     let cache = SqliteCacheStorage::new(default_data_dir().join("cache.db")).await?;
//!     // Hand both to CoreConfigBuilder
//!     Ok(())
//! }
//! ```

mod cache_storage;
mod http;
mod memory_cache;
mod network;
mod quota;

use std::path::PathBuf;

pub use cache_storage::SqliteCacheStorage;
pub use http::ReqwestHttpClient;
pub use memory_cache::MemoryCacheStorage;
pub use network::DesktopNetworkMonitor;
pub use quota::{DirectoryStorageEstimator, DEFAULT_QUOTA_BYTES};

const APP_DIR: &str = "tilawa";

/// Per-user application data directory, falling back to the working directory
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_data_dir_is_namespaced() {
        assert!(default_data_dir().ends_with(APP_DIR));
    }
}
