//! Core service façade and bootstrap helpers.
//!
//! This crate is the composition root: it takes host-provided bridge
//! implementations (HTTP, cache storage, connectivity, quota, clock) and
//! builds the interception worker, the offline store and the content client
//! that share them. Desktop apps typically enable the `desktop-shims` feature
//! (which depends on `bridge-desktop`) and call [`bootstrap_desktop`].

pub mod error;

pub use error::{CoreError, Result};

use std::sync::Arc;

use bridge_traits::{
    CacheStorage, Clock, HttpClient, HttpRequest, HttpResponse, NetworkMonitor, StorageEstimate,
    StorageEstimator,
};
use chrono::NaiveDate;
use core_content::ContentClient;
use core_intercept::{InterceptConfig, InterceptionWorker, WorkerEvent, WorkerOutcome};
use core_offline::{ConnectivityWatcher, OfflineStore, OfflineStoreConfig};
use core_runtime::config::CoreConfig;
use core_runtime::events::{EventBus, EventStream, DEFAULT_EVENT_BUFFER_SIZE};
use core_study::ReadingPlan;
use parking_lot::RwLock;
use tracing::info;
use uuid::Uuid;

#[cfg(feature = "desktop-shims")]
const RESPONSE_CACHE_FILE: &str = "responses.db";

/// Aggregated handle to all bridge dependencies the core requires.
pub struct CoreDependencies {
    pub http_client: Arc<dyn HttpClient>,
    pub cache_storage: Arc<dyn CacheStorage>,
    pub network_monitor: Option<Arc<dyn NetworkMonitor>>,
    pub storage_estimator: Option<Arc<dyn StorageEstimator>>,
    pub clock: Arc<dyn Clock>,
}

impl CoreDependencies {
    /// Take the bridges already carried by `config`. The cache storage must
    /// have been injected.
    pub fn from_config(config: &CoreConfig) -> Result<Self> {
        let cache_storage = config
            .cache_storage
            .clone()
            .ok_or_else(|| CoreError::CapabilityMissing {
                capability: "CacheStorage".to_string(),
                message: "Inject a CacheStorage or enable the desktop-shims feature".to_string(),
            })?;

        Ok(Self {
            http_client: Arc::clone(&config.http_client),
            cache_storage,
            network_monitor: config.network_monitor.clone(),
            storage_estimator: config.storage_estimator.clone(),
            clock: Arc::clone(&config.clock),
        })
    }
}

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct CoreService {
    inner: Arc<Inner>,
}

struct Inner {
    config: CoreConfig,
    event_bus: EventBus,
    worker: InterceptionWorker,
    store: OfflineStore,
    content: ContentClient,
    connectivity: Option<ConnectivityWatcher>,
    user_id: RwLock<Option<Uuid>>,
}

/// Build the core from explicit bridge dependencies.
///
/// The worker starts in its initial state; send it
/// [`WorkerEvent::Install`] to precache the shell.
pub async fn bootstrap(config: CoreConfig, deps: CoreDependencies) -> Result<CoreService> {
    config.validate()?;

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            CoreError::InitializationFailed(format!(
                "cannot create database directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }

    let event_bus = EventBus::new(DEFAULT_EVENT_BUFFER_SIZE);

    let worker = InterceptionWorker::new(
        InterceptConfig::from_core(&config),
        Arc::clone(&deps.http_client),
        deps.cache_storage,
    )?
    .with_event_bus(event_bus.clone());

    let mut store = OfflineStore::open_with_clock(
        OfflineStoreConfig::from_core(&config),
        Arc::clone(&deps.http_client),
        deps.clock,
    )
    .await?
    .with_event_bus(event_bus.clone());
    if let Some(estimator) = deps.storage_estimator {
        store = store.with_estimator(estimator);
    }

    let connectivity = match (config.features.enable_network_awareness, deps.network_monitor) {
        (true, Some(monitor)) => {
            Some(ConnectivityWatcher::new(monitor).with_event_bus(event_bus.clone()))
        }
        _ => None,
    };

    let content = ContentClient::new(deps.http_client);

    info!(
        origin = %config.origin,
        cache_version = %config.cache_version,
        network_awareness = connectivity.is_some(),
        "Core service bootstrapped"
    );

    Ok(CoreService {
        inner: Arc::new(Inner {
            config,
            event_bus,
            worker,
            store,
            content,
            connectivity,
            user_id: RwLock::new(None),
        }),
    })
}

/// Build the core with desktop bridges filling any gap in `config`. A
/// missing cache storage becomes a SQLite file under the cache directory.
#[cfg(feature = "desktop-shims")]
pub async fn bootstrap_desktop(config: CoreConfig) -> Result<CoreService> {
    let cache_storage: Arc<dyn CacheStorage> = match &config.cache_storage {
        Some(storage) => Arc::clone(storage),
        None => Arc::new(
            bridge_desktop::SqliteCacheStorage::new(config.cache_dir.join(RESPONSE_CACHE_FILE))
                .await?,
        ),
    };

    let deps = CoreDependencies {
        http_client: Arc::clone(&config.http_client),
        cache_storage,
        network_monitor: config.network_monitor.clone(),
        storage_estimator: config.storage_estimator.clone(),
        clock: Arc::clone(&config.clock),
    };

    bootstrap(config, deps).await
}

impl CoreService {
    pub fn config(&self) -> &CoreConfig {
        &self.inner.config
    }

    pub fn worker(&self) -> &InterceptionWorker {
        &self.inner.worker
    }

    pub fn offline_store(&self) -> &OfflineStore {
        &self.inner.store
    }

    pub fn content(&self) -> &ContentClient {
        &self.inner.content
    }

    pub fn connectivity(&self) -> Option<&ConnectivityWatcher> {
        self.inner.connectivity.as_ref()
    }

    pub fn subscribe_events(&self) -> EventStream {
        EventStream::new(self.inner.event_bus.subscribe())
    }

    pub async fn handle(&self, event: WorkerEvent) -> Result<WorkerOutcome> {
        Ok(self.inner.worker.handle(event).await?)
    }

    /// Send a request through the interception worker.
    pub async fn fetch(&self, request: HttpRequest) -> Result<HttpResponse> {
        Ok(self.inner.worker.fetch(request).await?)
    }

    pub async fn estimate_usage(&self) -> StorageEstimate {
        self.inner.store.estimate_usage().await
    }

    /// Online flag; without network awareness the core assumes online.
    pub async fn is_online(&self) -> bool {
        match &self.inner.connectivity {
            Some(watcher) => watcher.is_online().await,
            None => true,
        }
    }

    // ------------------------------------------------------------------
    // Identity
    // ------------------------------------------------------------------

    pub fn sign_in_as(&self, user_id: Uuid) {
        *self.inner.user_id.write() = Some(user_id);
    }

    pub fn sign_out(&self) {
        *self.inner.user_id.write() = None;
    }

    pub fn current_user(&self) -> Option<Uuid> {
        *self.inner.user_id.read()
    }

    fn require_user(&self) -> Result<Uuid> {
        self.current_user().ok_or(CoreError::NotAuthenticated)
    }

    /// Create a reading plan for the signed-in user. Fails before doing any
    /// work when nobody is signed in.
    pub fn create_reading_plan(
        &self,
        total_days: u16,
        start: NaiveDate,
    ) -> Result<(Uuid, ReadingPlan)> {
        let user_id = self.require_user()?;
        let plan = ReadingPlan::partition(total_days, start)?;
        info!(user_id = %user_id, plan_id = %plan.id, total_days, "Reading plan created");
        Ok((user_id, plan))
    }

    /// Wait for background cache writes, then close the offline store.
    pub async fn shutdown(&self) {
        self.inner.worker.flush_background().await;
        self.inner.store.close().await;
        info!("Core service shut down");
    }
}
