//! Upstream endpoint configuration

use url::Url;

use crate::error::{ContentError, Result};

pub const DEFAULT_ALQURAN_BASE: &str = "https://api.alquran.cloud/v1";
pub const DEFAULT_QURAN_COM_BASE: &str = "https://api.quran.com/api/v4";
pub const DEFAULT_TAFSIR_CDN_BASE: &str = "https://cdn.jsdelivr.net/gh/spa5k/tafsir_api@main/tafsir";
pub const DEFAULT_AUDIO_BASE: &str = "https://everyayah.com/data";

/// Where commentary for one ayah comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentaryProvider {
    /// A quran.com tafsir resource, `GET {quran_com}/tafsirs/{id}/by_ayah/{s}:{a}`
    QuranCom { tafsir_id: u32, author: String },
    /// A static tafsir file, `GET {tafsir_cdn}/{slug}/{s}/{a}.json`
    TafsirCdn { slug: String, author: String },
}

impl CommentaryProvider {
    pub fn author(&self) -> &str {
        match self {
            CommentaryProvider::QuranCom { author, .. } => author,
            CommentaryProvider::TafsirCdn { author, .. } => author,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentEndpoints {
    pub alquran_base: String,
    pub quran_com_base: String,
    pub tafsir_cdn_base: String,
    pub audio_base: String,
    /// Queried in order; results are merged in the same order
    pub commentary_providers: Vec<CommentaryProvider>,
}

impl Default for ContentEndpoints {
    fn default() -> Self {
        Self {
            alquran_base: DEFAULT_ALQURAN_BASE.to_string(),
            quran_com_base: DEFAULT_QURAN_COM_BASE.to_string(),
            tafsir_cdn_base: DEFAULT_TAFSIR_CDN_BASE.to_string(),
            audio_base: DEFAULT_AUDIO_BASE.to_string(),
            commentary_providers: vec![
                CommentaryProvider::QuranCom {
                    tafsir_id: 169,
                    author: "Ibn Kathir".to_string(),
                },
                CommentaryProvider::TafsirCdn {
                    slug: "en-al-jalalayn".to_string(),
                    author: "Al-Jalalayn".to_string(),
                },
            ],
        }
    }
}

impl ContentEndpoints {
    pub fn with_alquran_base(mut self, base: impl Into<String>) -> Self {
        self.alquran_base = base.into();
        self
    }

    pub fn with_quran_com_base(mut self, base: impl Into<String>) -> Self {
        self.quran_com_base = base.into();
        self
    }

    pub fn with_tafsir_cdn_base(mut self, base: impl Into<String>) -> Self {
        self.tafsir_cdn_base = base.into();
        self
    }

    pub fn with_audio_base(mut self, base: impl Into<String>) -> Self {
        self.audio_base = base.into();
        self
    }

    pub fn with_commentary_providers(mut self, providers: Vec<CommentaryProvider>) -> Self {
        self.commentary_providers = providers;
        self
    }

    pub fn validate(&self) -> Result<()> {
        for (name, base) in [
            ("alquran_base", &self.alquran_base),
            ("quran_com_base", &self.quran_com_base),
            ("tafsir_cdn_base", &self.tafsir_cdn_base),
            ("audio_base", &self.audio_base),
        ] {
            let parsed = Url::parse(base).map_err(|e| ContentError::InvalidEndpoint {
                name,
                reason: e.to_string(),
            })?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ContentError::InvalidEndpoint {
                    name,
                    reason: format!("unsupported scheme {}", parsed.scheme()),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let endpoints = ContentEndpoints::default();
        assert!(endpoints.validate().is_ok());
        assert_eq!(endpoints.commentary_providers.len(), 2);
        assert_eq!(endpoints.commentary_providers[0].author(), "Ibn Kathir");
    }

    #[test]
    fn test_rejects_non_http_base() {
        let endpoints = ContentEndpoints::default().with_audio_base("file:///audio");
        assert!(matches!(
            endpoints.validate(),
            Err(ContentError::InvalidEndpoint { name: "audio_base", .. })
        ));
    }
}
