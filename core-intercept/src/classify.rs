//! Request classification
//!
//! Decides which caching policy applies to a URL. Rules are checked in order
//! and the first match wins: API host, then media, then everything else.

use url::Url;

use crate::config::InterceptConfig;

/// Which policy a request is served with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestClass {
    /// Content API: stale-while-revalidate into the api partition
    Api,
    /// Audio: cache-first into the media partition
    Media,
    /// Navigation and everything else: network-first with offline fallback
    Default,
}

#[derive(Debug, Clone)]
pub struct Classifier {
    api_hosts: Vec<String>,
    media_path_marker: String,
    media_extension: String,
}

impl Classifier {
    pub fn new(config: &InterceptConfig) -> Self {
        Self {
            api_hosts: config
                .api_hosts
                .iter()
                .map(|host| host.trim().to_ascii_lowercase())
                .collect(),
            media_path_marker: config.media_path_marker.clone(),
            media_extension: config.media_extension.to_ascii_lowercase(),
        }
    }

    pub fn classify(&self, url: &str) -> RequestClass {
        let Ok(parsed) = Url::parse(url) else {
            return RequestClass::Default;
        };

        if let Some(host) = parsed.host_str() {
            if self.api_hosts.iter().any(|api| api == host) {
                return RequestClass::Api;
            }
        }

        let path = parsed.path();
        let marker_hit = !self.media_path_marker.is_empty() && path.contains(&self.media_path_marker);
        let extension_hit = !self.media_extension.is_empty()
            && path.to_ascii_lowercase().ends_with(&self.media_extension);

        if marker_hit || extension_hit {
            RequestClass::Media
        } else {
            RequestClass::Default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> Classifier {
        Classifier::new(&InterceptConfig::new("https://quran.app"))
    }

    #[test]
    fn test_api_hosts() {
        let c = classifier();
        assert_eq!(c.classify("https://api.alquran.cloud/v1/surah/2"), RequestClass::Api);
        assert_eq!(c.classify("https://API.QURAN.COM/api/v4/chapters"), RequestClass::Api);
        assert_eq!(
            c.classify("https://cdn.jsdelivr.net/gh/fawazahmed0/quran-api/editions.json"),
            RequestClass::Api
        );
    }

    #[test]
    fn test_api_host_wins_over_media() {
        assert_eq!(
            classifier().classify("https://api.quran.com/audio/ayah/1.mp3"),
            RequestClass::Api
        );
    }

    #[test]
    fn test_media_by_marker_or_extension() {
        let c = classifier();
        assert_eq!(
            c.classify("https://everyayah.com/data/Alafasy_128kbps/002005.MP3"),
            RequestClass::Media
        );
        assert_eq!(
            c.classify("https://cdn.islamic.network/quran/audio/128/ar.alafasy/262"),
            RequestClass::Media
        );
        assert_eq!(
            c.classify("https://cdn.example/file.mp3?token=abc"),
            RequestClass::Media
        );
    }

    #[test]
    fn test_everything_else_is_default() {
        let c = classifier();
        assert_eq!(c.classify("https://quran.app/surah/2"), RequestClass::Default);
        assert_eq!(c.classify("https://quran.app/app.js"), RequestClass::Default);
        assert_eq!(c.classify("not a url"), RequestClass::Default);
    }
}
