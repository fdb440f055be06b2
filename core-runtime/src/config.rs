//! # Core Configuration Module
//!
//! Provides configuration management for the offline caching core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! holding every bridge and setting the interception worker and the offline
//! store need. Validation is fail-fast: a bad origin, an empty asset list or a
//! feature flag without its bridge is rejected at `build()` time rather than
//! at the first intercepted request.
//!
//! ## Required Dependencies
//!
//! - `HttpClient` - Fetch primitive (desktop default: reqwest)
//!
//! ## Optional Dependencies
//!
//! - `CacheStorage` - Partitioned response cache. Resolved by the service
//!   layer when absent (desktop: SQLite file under `cache_dir`)
//! - `NetworkMonitor` - Connectivity flag (desktop default: reachability probe)
//! - `StorageEstimator` - Usage/quota (desktop default: directory sizes)
//! - `Clock` - Save timestamps (default: system clock)
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .database_path("/data/tilawa/offline.db")
//!     .cache_dir("/data/tilawa/cache")
//!     .origin("https://quran.app")
//!     .cache_version("v3")
//!     .http_client(Arc::new(MyHttpClient))
//!     .cache_storage(Arc::new(MyCacheStorage))
//!     .build()?;
//! ```
//!
//! ## Error Handling
//!
//! ```should_panic
//! use core_runtime::config::CoreConfig;
//!
//! // Missing database path
//! let config = CoreConfig::builder()
//!     .cache_dir("/cache")
//!     .build()
//!     .expect("database path is required");
//! ```

use crate::error::{Error, Result};
use bridge_traits::{CacheStorage, Clock, HttpClient, NetworkMonitor, StorageEstimator, SystemClock};
use std::path::PathBuf;
use std::sync::Arc;
use url::Url;

/// App-shell resources pre-cached at install time
pub const DEFAULT_SHELL_ASSETS: &[&str] = &["/", "/index.html", "/manifest.json"];

/// Hosts whose responses are served stale-while-revalidate
pub const DEFAULT_API_HOSTS: &[&str] = &["api.alquran.cloud", "api.quran.com", "cdn.jsdelivr.net"];

pub const DEFAULT_MEDIA_PATH_MARKER: &str = "/audio/";
pub const DEFAULT_MEDIA_EXTENSION: &str = ".mp3";
pub const DEFAULT_OFFLINE_DOCUMENT: &str = "/index.html";
pub const DEFAULT_ORIGIN: &str = "http://localhost";

/// Core configuration for the offline caching core.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Path to the offline store's SQLite database file
    pub database_path: PathBuf,

    /// Directory for the response cache and materialized playback files
    pub cache_dir: PathBuf,

    /// Origin shell assets are resolved against
    pub origin: String,

    /// Deployment version prefixed to partition names. Empty means unversioned.
    pub cache_version: String,

    /// App-shell paths pre-cached at install
    pub shell_assets: Vec<String>,

    /// Hostnames classified as content API
    pub api_hosts: Vec<String>,

    /// Path fragment that marks a media request
    pub media_path_marker: String,

    /// Path suffix that marks a media request
    pub media_extension: String,

    /// Cached document served for navigations while offline
    pub offline_document: String,

    /// Byte budget for offline audio, `None` for unbounded
    pub max_audio_bytes: Option<u64>,

    pub http_client: Arc<dyn HttpClient>,

    pub cache_storage: Option<Arc<dyn CacheStorage>>,

    pub network_monitor: Option<Arc<dyn NetworkMonitor>>,

    pub storage_estimator: Option<Arc<dyn StorageEstimator>>,

    pub clock: Arc<dyn Clock>,

    pub features: FeatureFlags,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("database_path", &self.database_path)
            .field("cache_dir", &self.cache_dir)
            .field("origin", &self.origin)
            .field("cache_version", &self.cache_version)
            .field("shell_assets", &self.shell_assets)
            .field("api_hosts", &self.api_hosts)
            .field("media_path_marker", &self.media_path_marker)
            .field("media_extension", &self.media_extension)
            .field("offline_document", &self.offline_document)
            .field("max_audio_bytes", &self.max_audio_bytes)
            .field("http_client", &"HttpClient { ... }")
            .field(
                "cache_storage",
                &self.cache_storage.as_ref().map(|_| "CacheStorage { ... }"),
            )
            .field(
                "network_monitor",
                &self
                    .network_monitor
                    .as_ref()
                    .map(|_| "NetworkMonitor { ... }"),
            )
            .field(
                "storage_estimator",
                &self
                    .storage_estimator
                    .as_ref()
                    .map(|_| "StorageEstimator { ... }"),
            )
            .field("features", &self.features)
            .finish()
    }
}

/// Feature flags control optional behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureFlags {
    /// Activate a freshly installed worker immediately and claim clients
    pub skip_waiting: bool,

    /// Surface online/offline transitions (requires NetworkMonitor)
    pub enable_network_awareness: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            skip_waiting: true,
            enable_network_awareness: false,
        }
    }
}

impl CoreConfig {
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.database_path.as_os_str().is_empty() {
            return Err(Error::Config("Database path cannot be empty".to_string()));
        }

        if self.cache_dir.as_os_str().is_empty() {
            return Err(Error::Config("Cache directory cannot be empty".to_string()));
        }

        let origin = Url::parse(&self.origin)
            .map_err(|e| Error::Config(format!("Invalid origin '{}': {}", self.origin, e)))?;
        if !matches!(origin.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "Origin must be http or https, got '{}'",
                origin.scheme()
            )));
        }

        if self
            .cache_version
            .chars()
            .any(|c| c.is_whitespace() || c == '/')
        {
            return Err(Error::Config(
                "Cache version may not contain whitespace or '/'".to_string(),
            ));
        }

        if self.shell_assets.is_empty() {
            return Err(Error::Config(
                "At least one shell asset is required for install".to_string(),
            ));
        }

        if self.api_hosts.iter().any(|host| host.trim().is_empty()) {
            return Err(Error::Config("API hosts cannot be empty".to_string()));
        }

        if self.media_path_marker.is_empty() && self.media_extension.is_empty() {
            return Err(Error::Config(
                "Media classification needs a path marker or an extension".to_string(),
            ));
        }

        if !self.offline_document.starts_with('/') {
            return Err(Error::Config(
                "Offline document must be an absolute path".to_string(),
            ));
        }

        if self.max_audio_bytes == Some(0) {
            return Err(Error::Config(
                "Audio budget must be greater than 0 bytes".to_string(),
            ));
        }

        if self.features.enable_network_awareness && self.network_monitor.is_none() {
            return Err(Error::Config(
                "Network awareness enabled but no NetworkMonitor provided. \
                 Disable the feature or inject a NetworkMonitor implementation."
                    .to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client() -> Result<Arc<dyn HttpClient>> {
    let client: Arc<dyn HttpClient> = Arc::new(bridge_desktop::ReqwestHttpClient::new()?);
    Ok(client)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client() -> Result<Arc<dyn HttpClient>> {
    Err(Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: "HttpClient implementation is required for every cache policy. \
                 Desktop: ensure the 'desktop-shims' feature is enabled to use ReqwestHttpClient. \
                 Web: inject a fetch()-based client."
            .to_string(),
    })
}

#[cfg(feature = "desktop-shims")]
fn provide_default_network_monitor() -> Option<Arc<dyn NetworkMonitor>> {
    Some(Arc::new(bridge_desktop::DesktopNetworkMonitor::new()))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_network_monitor() -> Option<Arc<dyn NetworkMonitor>> {
    None
}

#[cfg(feature = "desktop-shims")]
fn provide_default_storage_estimator(
    database_path: &std::path::Path,
    cache_dir: &std::path::Path,
) -> Option<Arc<dyn StorageEstimator>> {
    Some(Arc::new(
        bridge_desktop::DirectoryStorageEstimator::new(cache_dir).with_root(database_path),
    ))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_storage_estimator(
    _database_path: &std::path::Path,
    _cache_dir: &std::path::Path,
) -> Option<Arc<dyn StorageEstimator>> {
    None
}

/// Builder for constructing [`CoreConfig`] instances.
#[derive(Default)]
pub struct CoreConfigBuilder {
    database_path: Option<PathBuf>,
    cache_dir: Option<PathBuf>,
    origin: Option<String>,
    cache_version: Option<String>,
    shell_assets: Option<Vec<String>>,
    api_hosts: Option<Vec<String>>,
    media_path_marker: Option<String>,
    media_extension: Option<String>,
    offline_document: Option<String>,
    max_audio_bytes: Option<u64>,
    http_client: Option<Arc<dyn HttpClient>>,
    cache_storage: Option<Arc<dyn CacheStorage>>,
    network_monitor: Option<Arc<dyn NetworkMonitor>>,
    storage_estimator: Option<Arc<dyn StorageEstimator>>,
    clock: Option<Arc<dyn Clock>>,
    features: FeatureFlags,
}

impl CoreConfigBuilder {
    /// Sets the offline store database path.
    ///
    /// ```
    /// use core_runtime::config::CoreConfig;
    ///
    /// let builder = CoreConfig::builder()
    ///     .database_path("/data/tilawa/offline.db");
    /// ```
    pub fn database_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.database_path = Some(path.into());
        self
    }

    pub fn cache_dir<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.cache_dir = Some(path.into());
        self
    }

    /// Sets the origin shell assets resolve against.
    ///
    /// Default: `http://localhost`
    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Sets the deployment version used to name cache partitions.
    ///
    /// Bumping the version causes the next activation to purge every
    /// partition created under the previous one.
    pub fn cache_version(mut self, version: impl Into<String>) -> Self {
        self.cache_version = Some(version.into());
        self
    }

    pub fn shell_assets<I, S>(mut self, assets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.shell_assets = Some(assets.into_iter().map(Into::into).collect());
        self
    }

    pub fn api_hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.api_hosts = Some(hosts.into_iter().map(Into::into).collect());
        self
    }

    pub fn media_path_marker(mut self, marker: impl Into<String>) -> Self {
        self.media_path_marker = Some(marker.into());
        self
    }

    pub fn media_extension(mut self, extension: impl Into<String>) -> Self {
        self.media_extension = Some(extension.into());
        self
    }

    pub fn offline_document(mut self, path: impl Into<String>) -> Self {
        self.offline_document = Some(path.into());
        self
    }

    /// Caps the bytes held by saved audio. Oldest recitations are evicted first.
    ///
    /// Default: unbounded
    pub fn max_audio_bytes(mut self, bytes: u64) -> Self {
        self.max_audio_bytes = Some(bytes);
        self
    }

    /// Sets the HTTP client implementation.
    ///
    /// If not provided, the desktop default (reqwest-based) is used when the
    /// `desktop-shims` feature is enabled.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn cache_storage(mut self, storage: Arc<dyn CacheStorage>) -> Self {
        self.cache_storage = Some(storage);
        self
    }

    pub fn network_monitor(mut self, monitor: Arc<dyn NetworkMonitor>) -> Self {
        self.network_monitor = Some(monitor);
        self
    }

    pub fn storage_estimator(mut self, estimator: Arc<dyn StorageEstimator>) -> Self {
        self.storage_estimator = Some(estimator);
        self
    }

    /// Sets the time source used for save stamps.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Default: true
    pub fn skip_waiting(mut self, enabled: bool) -> Self {
        self.features.skip_waiting = enabled;
        self
    }

    /// Requires a `NetworkMonitor` to be provided.
    ///
    /// Default: false
    pub fn enable_network_awareness(mut self, enabled: bool) -> Self {
        self.features.enable_network_awareness = enabled;
        self
    }

    pub fn features(mut self, features: FeatureFlags) -> Self {
        self.features = features;
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// # Errors
    ///
    /// - Required paths or the HTTP client are missing
    /// - Configuration values are invalid
    /// - Feature flags are inconsistent with available bridges
    pub fn build(self) -> Result<CoreConfig> {
        let database_path = self.database_path.ok_or_else(|| {
            Error::Config("Database path is required. Use .database_path() to set it.".to_string())
        })?;

        let cache_dir = self.cache_dir.ok_or_else(|| {
            Error::Config("Cache directory is required. Use .cache_dir() to set it.".to_string())
        })?;

        let http_client = match self.http_client {
            Some(client) => client,
            None => provide_default_http_client()?,
        };

        let network_monitor = self
            .network_monitor
            .or_else(provide_default_network_monitor);

        let storage_estimator = self
            .storage_estimator
            .or_else(|| provide_default_storage_estimator(&database_path, &cache_dir));

        let config = CoreConfig {
            database_path,
            cache_dir,
            origin: self.origin.unwrap_or_else(|| DEFAULT_ORIGIN.to_string()),
            cache_version: self.cache_version.unwrap_or_default(),
            shell_assets: self
                .shell_assets
                .unwrap_or_else(|| DEFAULT_SHELL_ASSETS.iter().map(|s| s.to_string()).collect()),
            api_hosts: self
                .api_hosts
                .unwrap_or_else(|| DEFAULT_API_HOSTS.iter().map(|s| s.to_string()).collect()),
            media_path_marker: self
                .media_path_marker
                .unwrap_or_else(|| DEFAULT_MEDIA_PATH_MARKER.to_string()),
            media_extension: self
                .media_extension
                .unwrap_or_else(|| DEFAULT_MEDIA_EXTENSION.to_string()),
            offline_document: self
                .offline_document
                .unwrap_or_else(|| DEFAULT_OFFLINE_DOCUMENT.to_string()),
            max_audio_bytes: self.max_audio_bytes,
            http_client,
            cache_storage: self.cache_storage,
            network_monitor,
            storage_estimator,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            features: self.features,
        };

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::{BridgeError, HttpRequest, HttpResponse};

    struct NoopHttpClient;

    #[async_trait]
    impl HttpClient for NoopHttpClient {
        async fn execute(
            &self,
            _request: HttpRequest,
        ) -> std::result::Result<HttpResponse, BridgeError> {
            Ok(HttpResponse::new(204, ""))
        }
    }

    fn base() -> CoreConfigBuilder {
        CoreConfig::builder()
            .database_path("/data/offline.db")
            .cache_dir("/data/cache")
            .http_client(Arc::new(NoopHttpClient))
    }

    #[test]
    fn test_builder_requires_database_path() {
        let result = CoreConfig::builder()
            .cache_dir("/cache")
            .http_client(Arc::new(NoopHttpClient))
            .build();

        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Database path is required"));
    }

    #[test]
    fn test_builder_requires_cache_dir() {
        let result = CoreConfig::builder()
            .database_path("/data/offline.db")
            .http_client(Arc::new(NoopHttpClient))
            .build();

        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Cache directory is required"));
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_builder_requires_http_client_without_shims() {
        let err = CoreConfig::builder()
            .database_path("/data/offline.db")
            .cache_dir("/data/cache")
            .build()
            .unwrap_err();

        assert!(matches!(err, Error::CapabilityMissing { .. }));
        assert!(err.to_string().contains("HttpClient"));
    }

    #[test]
    fn test_defaults() {
        let config = base().build().unwrap();

        assert_eq!(config.origin, DEFAULT_ORIGIN);
        assert_eq!(config.cache_version, "");
        assert_eq!(config.shell_assets, vec!["/", "/index.html", "/manifest.json"]);
        assert_eq!(
            config.api_hosts,
            vec!["api.alquran.cloud", "api.quran.com", "cdn.jsdelivr.net"]
        );
        assert_eq!(config.media_path_marker, "/audio/");
        assert_eq!(config.media_extension, ".mp3");
        assert_eq!(config.offline_document, "/index.html");
        assert_eq!(config.max_audio_bytes, None);
        assert!(config.features.skip_waiting);
        assert!(!config.features.enable_network_awareness);
    }

    #[test]
    fn test_rejects_bad_origin() {
        let err = base().origin("not a url").build().unwrap_err();
        assert!(err.to_string().contains("Invalid origin"));

        let err = base().origin("ftp://quran.app").build().unwrap_err();
        assert!(err.to_string().contains("http or https"));
    }

    #[test]
    fn test_rejects_bad_version() {
        let err = base().cache_version("v 2").build().unwrap_err();
        assert!(err.to_string().contains("Cache version"));
    }

    #[test]
    fn test_rejects_empty_shell() {
        let err = base()
            .shell_assets(Vec::<String>::new())
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("shell asset"));
    }

    #[test]
    fn test_rejects_zero_audio_budget() {
        let err = base().max_audio_bytes(0).build().unwrap_err();
        assert!(err.to_string().contains("greater than 0"));
    }

    #[test]
    fn test_relative_offline_document_rejected() {
        let err = base().offline_document("index.html").build().unwrap_err();
        assert!(err.to_string().contains("absolute path"));
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_network_awareness_requires_monitor() {
        let err = base().enable_network_awareness(true).build().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Network awareness enabled"));
        assert!(msg.contains("NetworkMonitor"));
    }

    #[test]
    fn test_custom_values() {
        let config = base()
            .origin("https://quran.app")
            .cache_version("v3")
            .api_hosts(["api.quran.com"])
            .max_audio_bytes(10 * 1024 * 1024)
            .skip_waiting(false)
            .build()
            .unwrap();

        assert_eq!(config.cache_version, "v3");
        assert_eq!(config.api_hosts, vec!["api.quran.com"]);
        assert_eq!(config.max_audio_bytes, Some(10 * 1024 * 1024));
        assert!(!config.features.skip_waiting);
    }

    #[test]
    fn test_debug_hides_bridges() {
        let config = base().build().unwrap();
        let debug = format!("{:?}", config);
        assert!(debug.contains("HttpClient { ... }"));
        assert!(debug.contains("offline.db"));
    }
}
