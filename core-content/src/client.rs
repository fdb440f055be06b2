//! Quran Content API Client
//!
//! Reads scripture, editions, commentary and search results from the public
//! Quran APIs.
//!
//! ## API Endpoints
//!
//! - **Surah list**: `GET {alquran}/surah`
//! - **Surah editions**: `GET {alquran}/surah/{n}/editions/{e1},{e2}`
//! - **Search**: `GET {alquran}/search/{query}/all/en`
//! - **Commentary**: one request per configured [`CommentaryProvider`]
//! - **Audio**: `{audio_base}/{reciter}/{sss}{aaa}.mp3`
//!
//! Response bodies stay opaque JSON. Every failure (transport, non-2xx,
//! malformed body) is logged and degrades to an empty or absent result.

use std::sync::Arc;
use std::time::Duration;

use bridge_traits::http::{HttpClient, HttpRequest};
use futures::future::join_all;
use serde_json::Value;
use tracing::{debug, warn};

use crate::endpoints::{CommentaryProvider, ContentEndpoints};
use crate::error::{ContentError, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// One commentary passage, tagged with its author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commentary {
    pub author: String,
    pub body: String,
}

pub struct ContentClient {
    http_client: Arc<dyn HttpClient>,
    endpoints: ContentEndpoints,
}

impl ContentClient {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            endpoints: ContentEndpoints::default(),
        }
    }

    pub fn with_endpoints(http_client: Arc<dyn HttpClient>, endpoints: ContentEndpoints) -> Result<Self> {
        endpoints.validate()?;
        Ok(Self {
            http_client,
            endpoints,
        })
    }

    pub fn endpoints(&self) -> &ContentEndpoints {
        &self.endpoints
    }

    /// Metadata for all 114 surahs.
    pub async fn list_surahs(&self) -> Vec<Value> {
        let url = format!("{}/surah", self.endpoints.alquran_base);
        self.data_array(&url).await
    }

    /// One surah in each requested edition, e.g. `["quran-uthmani", "en.sahih"]`.
    pub async fn surah_editions(&self, number: u16, editions: &[&str]) -> Option<Value> {
        let url = if editions.is_empty() {
            format!("{}/surah/{}", self.endpoints.alquran_base, number)
        } else {
            let joined: Vec<_> = editions
                .iter()
                .map(|edition| urlencoding::encode(edition).into_owned())
                .collect();
            format!(
                "{}/surah/{}/editions/{}",
                self.endpoints.alquran_base,
                number,
                joined.join(",")
            )
        };

        match self.fetch_json(&url).await {
            Ok(mut body) => match body.get_mut("data").map(Value::take) {
                Some(Value::Null) | None => None,
                Some(data) => Some(data),
            },
            Err(error) => {
                warn!(url = %url, error = %error, "Surah request failed");
                None
            }
        }
    }

    /// Commentary from every provider, in provider order. A failing
    /// provider contributes nothing.
    pub async fn commentary(&self, surah: u16, ayah: u16) -> Vec<Commentary> {
        let requests = self
            .endpoints
            .commentary_providers
            .iter()
            .map(|provider| self.provider_commentary(provider, surah, ayah));

        join_all(requests).await.into_iter().flatten().collect()
    }

    async fn provider_commentary(
        &self,
        provider: &CommentaryProvider,
        surah: u16,
        ayah: u16,
    ) -> Option<Commentary> {
        let (url, pointer) = match provider {
            CommentaryProvider::QuranCom { tafsir_id, .. } => (
                format!(
                    "{}/tafsirs/{}/by_ayah/{}:{}",
                    self.endpoints.quran_com_base, tafsir_id, surah, ayah
                ),
                "/tafsir/text",
            ),
            CommentaryProvider::TafsirCdn { slug, .. } => (
                format!(
                    "{}/{}/{}/{}.json",
                    self.endpoints.tafsir_cdn_base, slug, surah, ayah
                ),
                "/text",
            ),
        };

        let body = match self.fetch_json(&url).await {
            Ok(body) => body,
            Err(error) => {
                warn!(author = provider.author(), error = %error, "Commentary provider failed");
                return None;
            }
        };

        match body.pointer(pointer).and_then(Value::as_str) {
            Some(text) if !text.trim().is_empty() => Some(Commentary {
                author: provider.author().to_string(),
                body: text.to_string(),
            }),
            _ => {
                debug!(author = provider.author(), "No commentary text in response");
                None
            }
        }
    }

    /// Playable recitation URL for one ayah. `reciter` is the audio folder
    /// name, e.g. `Alafasy_128kbps`.
    pub fn audio_url(&self, surah: u16, ayah: u16, reciter: &str) -> String {
        format!(
            "{}/{}/{:03}{:03}.mp3",
            self.endpoints.audio_base,
            urlencoding::encode(reciter),
            surah,
            ayah
        )
    }

    /// Full-text search across English translations.
    pub async fn search(&self, query: &str) -> Vec<Value> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }

        let url = format!(
            "{}/search/{}/all/en",
            self.endpoints.alquran_base,
            urlencoding::encode(query)
        );

        match self.fetch_json(&url).await {
            Ok(mut body) => match body.pointer_mut("/data/matches").map(Value::take) {
                Some(Value::Array(matches)) => matches,
                _ => Vec::new(),
            },
            Err(error) => {
                warn!(error = %error, "Search request failed");
                Vec::new()
            }
        }
    }

    async fn data_array(&self, url: &str) -> Vec<Value> {
        match self.fetch_json(url).await {
            Ok(mut body) => match body.get_mut("data").map(Value::take) {
                Some(Value::Array(items)) => items,
                _ => {
                    warn!(url = %url, "Response has no data array");
                    Vec::new()
                }
            },
            Err(error) => {
                warn!(url = %url, error = %error, "Content request failed");
                Vec::new()
            }
        }
    }

    async fn fetch_json(&self, url: &str) -> Result<Value> {
        debug!(url = %url, "Fetching content");

        let request = HttpRequest::get(url)
            .header("Accept", "application/json")
            .timeout(REQUEST_TIMEOUT);

        let response = self.http_client.execute(request).await?;

        if !response.is_success() {
            return Err(ContentError::HttpStatus {
                status: response.status,
                url: url.to_string(),
            });
        }

        serde_json::from_slice(&response.body).map_err(|e| ContentError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::http::{HttpResponse, RetryPolicy};
    use bridge_traits::BridgeError;
    use mockall::mock;

    mock! {
        pub Http {}

        #[async_trait::async_trait]
        impl HttpClient for Http {
            async fn execute(&self, request: HttpRequest) -> bridge_traits::Result<HttpResponse>;
            async fn execute_with_retry(
                &self,
                request: HttpRequest,
                policy: RetryPolicy,
            ) -> bridge_traits::Result<HttpResponse>;
        }
    }

    fn client_with<F>(handler: F) -> ContentClient
    where
        F: Fn(HttpRequest) -> bridge_traits::Result<HttpResponse> + Send + 'static,
    {
        let mut http = MockHttp::new();
        http.expect_execute().returning(handler);
        ContentClient::new(Arc::new(http))
    }

    fn json(body: &str) -> bridge_traits::Result<HttpResponse> {
        Ok(HttpResponse::new(200, body.to_string()))
    }

    #[tokio::test]
    async fn test_list_surahs_unwraps_data() {
        let client = client_with(|request| {
            assert_eq!(request.url, "https://api.alquran.cloud/v1/surah");
            json(r#"{"code":200,"data":[{"number":1},{"number":2}]}"#)
        });

        let surahs = client.list_surahs().await;
        assert_eq!(surahs.len(), 2);
        assert_eq!(surahs[1]["number"], 2);
    }

    #[tokio::test]
    async fn test_list_surahs_degrades_on_failure() {
        let offline = client_with(|_| Err(BridgeError::Network("offline".to_string())));
        assert!(offline.list_surahs().await.is_empty());

        let broken = client_with(|_| Ok(HttpResponse::new(502, "bad gateway")));
        assert!(broken.list_surahs().await.is_empty());

        let garbage = client_with(|_| json("<html>"));
        assert!(garbage.list_surahs().await.is_empty());
    }

    #[tokio::test]
    async fn test_surah_editions_url_and_absent() {
        let client = client_with(|request| {
            assert_eq!(
                request.url,
                "https://api.alquran.cloud/v1/surah/2/editions/quran-uthmani,en.sahih"
            );
            json(r#"{"data":[{"edition":"quran-uthmani"},{"edition":"en.sahih"}]}"#)
        });
        let editions = client
            .surah_editions(2, &["quran-uthmani", "en.sahih"])
            .await
            .unwrap();
        assert_eq!(editions.as_array().unwrap().len(), 2);

        let missing = client_with(|_| Ok(HttpResponse::new(404, "")));
        assert!(missing.surah_editions(200, &[]).await.is_none());
    }

    #[tokio::test]
    async fn test_commentary_merges_in_provider_order() {
        let client = client_with(|request| {
            if request.url.contains("api.quran.com") {
                json(r#"{"tafsir":{"text":"Ibn Kathir on 2:255"}}"#)
            } else {
                json(r#"{"text":"Jalalayn on 2:255"}"#)
            }
        });

        let commentary = client.commentary(2, 255).await;
        assert_eq!(
            commentary,
            vec![
                Commentary {
                    author: "Ibn Kathir".to_string(),
                    body: "Ibn Kathir on 2:255".to_string(),
                },
                Commentary {
                    author: "Al-Jalalayn".to_string(),
                    body: "Jalalayn on 2:255".to_string(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_failing_provider_contributes_nothing() {
        let client = client_with(|request| {
            if request.url.contains("api.quran.com") {
                Err(BridgeError::Network("timeout".to_string()))
            } else {
                json(r#"{"text":"Jalalayn on 1:1"}"#)
            }
        });

        let commentary = client.commentary(1, 1).await;
        assert_eq!(commentary.len(), 1);
        assert_eq!(commentary[0].author, "Al-Jalalayn");
    }

    #[test]
    fn test_audio_url_is_zero_padded() {
        let client = ContentClient::new(Arc::new(MockHttp::new()));
        assert_eq!(
            client.audio_url(2, 5, "Alafasy_128kbps"),
            "https://everyayah.com/data/Alafasy_128kbps/002005.mp3"
        );
    }

    #[tokio::test]
    async fn test_search_encodes_query_and_skips_blank() {
        let client = client_with(|request| {
            assert_eq!(
                request.url,
                "https://api.alquran.cloud/v1/search/day%20of%20judgment/all/en"
            );
            json(r#"{"data":{"count":1,"matches":[{"number":4}]}}"#)
        });
        let matches = client.search("day of judgment").await;
        assert_eq!(matches.len(), 1);

        let untouched = ContentClient::new(Arc::new(MockHttp::new()));
        assert!(untouched.search("   ").await.is_empty());
    }
}
