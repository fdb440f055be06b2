//! Partitioned Response Cache Abstraction
//!
//! A cache storage holds any number of named partitions. Each partition maps a
//! [`CacheKey`] (method + URL) to a stored [`HttpResponse`] snapshot. Partitions
//! come into existence on first write and disappear only when deleted as a
//! whole.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Identity of a cached entry within a partition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheKey {
    pub method: HttpMethod,
    pub url: String,
}

impl CacheKey {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn for_request(request: &HttpRequest) -> Self {
        Self::new(request.method, request.url.clone())
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

/// Partitioned cache storage trait
///
/// Writes replace existing entries wholesale (last write wins). Implementations
/// must make [`put_all`](CacheStorage::put_all) atomic: either every entry is
/// visible afterwards or none is.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::cache::{CacheKey, CacheStorage};
///
/// async fn cached_index(storage: &dyn CacheStorage) -> bool {
///     storage
///         .lookup("static", &CacheKey::get("https://quran.app/index.html"))
///         .await
///         .map(|entry| entry.is_some())
///         .unwrap_or(false)
/// }
/// ```
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Names of every partition that currently exists.
    async fn partition_names(&self) -> Result<Vec<String>>;

    /// Look up a stored response.
    async fn lookup(&self, partition: &str, key: &CacheKey) -> Result<Option<HttpResponse>>;

    /// Store a response, creating the partition if needed.
    async fn put(&self, partition: &str, key: CacheKey, response: HttpResponse) -> Result<()>;

    /// Store a batch of responses atomically.
    async fn put_all(&self, partition: &str, entries: Vec<(CacheKey, HttpResponse)>)
        -> Result<()>;

    /// Delete a partition and all its entries.
    ///
    /// Returns `true` if the partition existed.
    async fn delete_partition(&self, partition: &str) -> Result<bool>;

    /// Keys stored in a partition, empty if it does not exist.
    async fn keys(&self, partition: &str) -> Result<Vec<CacheKey>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_from_request() {
        let request = HttpRequest::new(HttpMethod::Head, "https://cdn.example/a.mp3");
        let key = CacheKey::for_request(&request);

        assert_eq!(key.method, HttpMethod::Head);
        assert_eq!(key.url, "https://cdn.example/a.mp3");
        assert_eq!(key.to_string(), "HEAD https://cdn.example/a.mp3");
    }

    #[test]
    fn test_cache_keys_distinguish_method() {
        assert_ne!(
            CacheKey::get("https://x.test/"),
            CacheKey::new(HttpMethod::Head, "https://x.test/")
        );
    }
}
