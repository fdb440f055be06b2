//! # Caching Policies
//!
//! The three per-request policies the worker applies once it controls
//! traffic:
//!
//! - **Stale-while-revalidate** for content API hosts
//! - **Cache-first** for audio media
//! - **Network-first** with offline fallback for everything else
//!
//! Only 2xx responses are ever written, each into exactly one partition.
//! Writes run as detached tasks on a [`TaskTracker`] and never hold up the
//! caller's response, except on the cache-first media path. Their failures
//! are logged and never reach the caller.

use std::sync::Arc;

use bridge_traits::{CacheKey, CacheStorage, HttpClient, HttpRequest, HttpResponse};
use tokio_util::task::TaskTracker;
use tracing::{debug, warn};

use crate::error::Result;
use crate::partition::PartitionNames;

pub(crate) struct Strategies {
    http: Arc<dyn HttpClient>,
    storage: Arc<dyn CacheStorage>,
    partitions: PartitionNames,
    offline_document_url: String,
    tracker: TaskTracker,
}

impl Strategies {
    pub(crate) fn new(
        http: Arc<dyn HttpClient>,
        storage: Arc<dyn CacheStorage>,
        partitions: PartitionNames,
        offline_document_url: String,
    ) -> Self {
        Self {
            http,
            storage,
            partitions,
            offline_document_url,
            tracker: TaskTracker::new(),
        }
    }

    pub(crate) fn tracker(&self) -> &TaskTracker {
        &self.tracker
    }

    /// Pass the request to the network untouched.
    pub(crate) async fn passthrough(&self, request: HttpRequest) -> Result<HttpResponse> {
        Ok(self.http.execute(request).await?)
    }

    pub(crate) async fn stale_while_revalidate(
        &self,
        request: HttpRequest,
    ) -> Result<HttpResponse> {
        let partition = self.partitions.api();
        let key = CacheKey::for_request(&request);

        if let Some(cached) = lookup(self.storage.as_ref(), partition, &key).await {
            debug!(partition, %key, "Cache hit, revalidating in background");
            self.spawn_store(partition.to_string(), key, request);
            return Ok(cached);
        }

        debug!(partition, %key, "Cache miss");
        let response = self.http.execute(request).await?;
        if response.is_success() {
            self.spawn_write(partition.to_string(), key, response.clone());
        }
        Ok(response)
    }

    /// The media write completes before the response is returned.
    pub(crate) async fn cache_first(&self, request: HttpRequest) -> Result<HttpResponse> {
        let partition = self.partitions.media();
        let key = CacheKey::for_request(&request);

        if let Some(cached) = lookup(self.storage.as_ref(), partition, &key).await {
            debug!(partition, %key, "Cache hit");
            return Ok(cached);
        }

        debug!(partition, %key, "Cache miss");
        let response = self.http.execute(request).await?;
        if response.is_success() {
            store(self.storage.as_ref(), partition, key, response.clone()).await;
        }
        Ok(response)
    }

    pub(crate) async fn network_first(&self, request: HttpRequest) -> Result<HttpResponse> {
        let partition = self.partitions.static_assets();
        let key = CacheKey::for_request(&request);
        let is_navigation = request.is_navigation();

        match self.http.execute(request).await {
            Ok(response) => {
                if response.is_success() && key.method.is_read() {
                    self.spawn_write(partition.to_string(), key, response.clone());
                }
                Ok(response)
            }
            Err(error) => {
                debug!(%key, error = %error, "Network unavailable, falling back to cache");

                if let Some(cached) = lookup(self.storage.as_ref(), partition, &key).await {
                    return Ok(cached);
                }

                if is_navigation {
                    let offline_key = CacheKey::get(self.offline_document_url.clone());
                    if let Some(document) =
                        lookup(self.storage.as_ref(), partition, &offline_key).await
                    {
                        debug!(%key, "Serving offline document");
                        return Ok(document);
                    }
                }

                warn!(%key, "No cached fallback, responding offline");
                Ok(HttpResponse::offline())
            }
        }
    }

    fn spawn_write(&self, partition: String, key: CacheKey, response: HttpResponse) {
        let storage = Arc::clone(&self.storage);
        self.tracker.spawn(async move {
            store(storage.as_ref(), &partition, key, response).await;
        });
    }

    /// Refetch `request` in the background and overwrite the entry on success.
    fn spawn_store(&self, partition: String, key: CacheKey, request: HttpRequest) {
        let http = Arc::clone(&self.http);
        let storage = Arc::clone(&self.storage);

        self.tracker.spawn(async move {
            match http.execute(request).await {
                Ok(response) if response.is_success() => {
                    store(storage.as_ref(), &partition, key, response).await;
                }
                Ok(response) => {
                    debug!(%key, status = response.status, "Revalidation kept stale entry");
                }
                Err(error) => {
                    warn!(%key, error = %error, "Revalidation failed");
                }
            }
        });
    }
}

/// Storage errors degrade to a miss.
async fn lookup(storage: &dyn CacheStorage, partition: &str, key: &CacheKey) -> Option<HttpResponse> {
    match storage.lookup(partition, key).await {
        Ok(entry) => entry,
        Err(error) => {
            warn!(partition, %key, error = %error, "Cache lookup failed");
            None
        }
    }
}

async fn store(storage: &dyn CacheStorage, partition: &str, key: CacheKey, response: HttpResponse) {
    if let Err(error) = storage.put(partition, key.clone(), response).await {
        warn!(partition, %key, error = %error, "Cache write failed");
    }
}
