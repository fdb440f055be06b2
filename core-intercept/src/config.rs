//! Interception worker configuration

use core_runtime::config::{
    CoreConfig, DEFAULT_API_HOSTS, DEFAULT_MEDIA_EXTENSION, DEFAULT_MEDIA_PATH_MARKER,
    DEFAULT_OFFLINE_DOCUMENT, DEFAULT_ORIGIN, DEFAULT_SHELL_ASSETS,
};
use url::Url;

use crate::error::{InterceptError, Result};

/// Configuration for the [`InterceptionWorker`](crate::InterceptionWorker).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterceptConfig {
    /// Origin the shell assets and offline document resolve against
    pub origin: String,

    /// Deployment version used to name partitions (empty = unversioned)
    pub cache_version: String,

    /// Paths fetched and cached at install
    pub shell_assets: Vec<String>,

    /// Hostnames served stale-while-revalidate
    pub api_hosts: Vec<String>,

    /// A path containing this is media
    pub media_path_marker: String,

    /// A path ending with this is media
    pub media_extension: String,

    /// Document returned for offline navigations
    pub offline_document: String,

    /// Activate immediately after a successful install
    pub skip_waiting: bool,
}

impl Default for InterceptConfig {
    fn default() -> Self {
        Self {
            origin: DEFAULT_ORIGIN.to_string(),
            cache_version: String::new(),
            shell_assets: DEFAULT_SHELL_ASSETS.iter().map(|s| s.to_string()).collect(),
            api_hosts: DEFAULT_API_HOSTS.iter().map(|s| s.to_string()).collect(),
            media_path_marker: DEFAULT_MEDIA_PATH_MARKER.to_string(),
            media_extension: DEFAULT_MEDIA_EXTENSION.to_string(),
            offline_document: DEFAULT_OFFLINE_DOCUMENT.to_string(),
            skip_waiting: true,
        }
    }
}

impl InterceptConfig {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            ..Self::default()
        }
    }

    /// Derive the worker settings from the validated core configuration.
    pub fn from_core(config: &CoreConfig) -> Self {
        Self {
            origin: config.origin.clone(),
            cache_version: config.cache_version.clone(),
            shell_assets: config.shell_assets.clone(),
            api_hosts: config.api_hosts.clone(),
            media_path_marker: config.media_path_marker.clone(),
            media_extension: config.media_extension.clone(),
            offline_document: config.offline_document.clone(),
            skip_waiting: config.features.skip_waiting,
        }
    }

    pub fn with_cache_version(mut self, version: impl Into<String>) -> Self {
        self.cache_version = version.into();
        self
    }

    pub fn with_shell_assets<I, S>(mut self, assets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.shell_assets = assets.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_api_hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.api_hosts = hosts.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_offline_document(mut self, path: impl Into<String>) -> Self {
        self.offline_document = path.into();
        self
    }

    pub fn with_skip_waiting(mut self, enabled: bool) -> Self {
        self.skip_waiting = enabled;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.origin_url()?;

        if self.shell_assets.is_empty() {
            return Err(InterceptError::InvalidConfig(
                "shell_assets cannot be empty".to_string(),
            ));
        }

        if self.media_path_marker.is_empty() && self.media_extension.is_empty() {
            return Err(InterceptError::InvalidConfig(
                "media_path_marker and media_extension cannot both be empty".to_string(),
            ));
        }

        Ok(())
    }

    fn origin_url(&self) -> Result<Url> {
        Url::parse(&self.origin).map_err(|e| InterceptError::InvalidUrl {
            url: self.origin.clone(),
            reason: e.to_string(),
        })
    }

    fn resolve(&self, path: &str) -> Result<Url> {
        self.origin_url()?
            .join(path)
            .map_err(|e| InterceptError::InvalidUrl {
                url: path.to_string(),
                reason: e.to_string(),
            })
    }

    /// Absolute URLs of every shell asset, in configured order.
    pub fn shell_asset_urls(&self) -> Result<Vec<String>> {
        self.shell_assets
            .iter()
            .map(|asset| self.resolve(asset).map(String::from))
            .collect()
    }

    pub fn offline_document_url(&self) -> Result<String> {
        self.resolve(&self.offline_document).map(String::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_assets_resolve_against_origin() {
        let config = InterceptConfig::new("https://quran.app");
        assert_eq!(
            config.shell_asset_urls().unwrap(),
            vec![
                "https://quran.app/",
                "https://quran.app/index.html",
                "https://quran.app/manifest.json",
            ]
        );
        assert_eq!(
            config.offline_document_url().unwrap(),
            "https://quran.app/index.html"
        );
    }

    #[test]
    fn test_validate_rejects_bad_origin_and_empty_shell() {
        assert!(InterceptConfig::new("quran.app").validate().is_err());

        let empty = InterceptConfig::new("https://quran.app").with_shell_assets(Vec::<String>::new());
        assert!(matches!(
            empty.validate(),
            Err(InterceptError::InvalidConfig(_))
        ));

        assert!(InterceptConfig::default().validate().is_ok());
    }
}
