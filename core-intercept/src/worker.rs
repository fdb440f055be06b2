//! # Interception Worker
//!
//! Owns the three cache partitions and drives the install/activate
//! lifecycle. Once activated it routes every request through the policy its
//! [`RequestClass`] selects.
//!
//! ## Usage
//!
//! ```ignore
//! let worker = InterceptionWorker::new(config, http, storage)?;
//! worker.handle(WorkerEvent::Install).await?;
//! let outcome = worker
//!     .handle(WorkerEvent::Fetch(HttpRequest::get("https://api.quran.com/api/v4/chapters")))
//!     .await?;
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use bridge_traits::{CacheKey, CacheStorage, HttpClient, HttpRequest, HttpResponse};
use core_runtime::events::{CoreEvent, EventBus, WorkerEvent as LifecycleEvent};
use futures::future::try_join_all;
use parking_lot::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::classify::{Classifier, RequestClass};
use crate::config::InterceptConfig;
use crate::error::{InterceptError, Result};
use crate::partition::PartitionNames;
use crate::strategy::Strategies;
use crate::sync::SyncHandler;

/// Lifecycle position of the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Parsed,
    Installing,
    /// Installed and waiting for activation
    Installed,
    Activating,
    /// Controls traffic
    Activated,
    /// Superseded or failed to install; never intercepts again
    Redundant,
}

/// Input the worker reacts to.
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    Install,
    Activate,
    Fetch(HttpRequest),
    Sync { tag: String },
}

/// Result of handling a [`WorkerEvent`].
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerOutcome {
    Installed {
        asset_count: usize,
        /// Partitions purged, when skip-waiting activated immediately
        activation: Option<Vec<String>>,
    },
    Activated {
        purged: Vec<String>,
    },
    Response(HttpResponse),
    Synced {
        tag: String,
        /// False when no handler is registered for the tag
        handled: bool,
    },
}

pub struct InterceptionWorker {
    config: InterceptConfig,
    partitions: PartitionNames,
    classifier: Classifier,
    http: Arc<dyn HttpClient>,
    storage: Arc<dyn CacheStorage>,
    strategies: Strategies,
    state: RwLock<WorkerState>,
    sync_handlers: RwLock<HashMap<String, Arc<dyn SyncHandler>>>,
    event_bus: Option<EventBus>,
}

impl InterceptionWorker {
    pub fn new(
        config: InterceptConfig,
        http: Arc<dyn HttpClient>,
        storage: Arc<dyn CacheStorage>,
    ) -> Result<Self> {
        config.validate()?;

        let partitions = PartitionNames::for_version(&config.cache_version);
        let strategies = Strategies::new(
            Arc::clone(&http),
            Arc::clone(&storage),
            partitions.clone(),
            config.offline_document_url()?,
        );

        Ok(Self {
            classifier: Classifier::new(&config),
            config,
            partitions,
            http,
            storage,
            strategies,
            state: RwLock::new(WorkerState::Parsed),
            sync_handlers: RwLock::new(HashMap::new()),
            event_bus: None,
        })
    }

    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn state(&self) -> WorkerState {
        *self.state.read()
    }

    pub fn partitions(&self) -> &PartitionNames {
        &self.partitions
    }

    pub fn config(&self) -> &InterceptConfig {
        &self.config
    }

    pub fn classify(&self, url: &str) -> RequestClass {
        self.classifier.classify(url)
    }

    /// Register a handler for background sync events. Replaces any handler
    /// previously registered for the same tag.
    pub fn register_sync_handler(&self, handler: Arc<dyn SyncHandler>) {
        let tag = handler.tag().to_string();
        debug!(tag = %tag, "Registered sync handler");
        self.sync_handlers.write().insert(tag, handler);
    }

    pub async fn handle(&self, event: WorkerEvent) -> Result<WorkerOutcome> {
        match event {
            WorkerEvent::Install => self.install().await,
            WorkerEvent::Activate => {
                let purged = self.activate().await?;
                Ok(WorkerOutcome::Activated { purged })
            }
            WorkerEvent::Fetch(request) => self.fetch(request).await.map(WorkerOutcome::Response),
            WorkerEvent::Sync { tag } => self.sync(tag).await,
        }
    }

    /// Take the worker out of service. It stops intercepting immediately.
    pub fn mark_redundant(&self) {
        let previous = std::mem::replace(&mut *self.state.write(), WorkerState::Redundant);
        if previous != WorkerState::Redundant {
            info!(?previous, "Worker superseded");
            self.emit(LifecycleEvent::Redundant);
        }
    }

    /// Wait for detached revalidation and mirroring writes to finish.
    pub async fn flush_background(&self) {
        let tracker = self.strategies.tracker();
        tracker.close();
        tracker.wait().await;
        tracker.reopen();
    }

    #[instrument(skip(self))]
    async fn install(&self) -> Result<WorkerOutcome> {
        self.transition(WorkerState::Parsed, WorkerState::Installing, "install")?;

        let entries = match self.precache().await {
            Ok(entries) => entries,
            Err(error) => {
                warn!(error = %error, "Install failed");
                *self.state.write() = WorkerState::Redundant;
                self.emit(LifecycleEvent::InstallFailed {
                    message: error.to_string(),
                });
                return Err(error);
            }
        };

        let asset_count = entries.len();
        *self.state.write() = WorkerState::Installed;
        info!(
            partition = self.partitions.static_assets(),
            asset_count, "Worker installed"
        );
        self.emit(LifecycleEvent::Installed {
            partition: self.partitions.static_assets().to_string(),
            asset_count,
        });

        let activation = if self.config.skip_waiting {
            Some(self.activate().await?)
        } else {
            None
        };

        Ok(WorkerOutcome::Installed {
            asset_count,
            activation,
        })
    }

    /// Fetch every shell asset, then write them as one batch. Any failed or
    /// non-2xx fetch aborts before anything is written.
    async fn precache(&self) -> Result<Vec<CacheKey>> {
        let urls = self.config.shell_asset_urls()?;

        let fetches = urls.into_iter().map(|url| {
            let http = Arc::clone(&self.http);
            async move {
                let response = http
                    .execute(HttpRequest::get(url.clone()))
                    .await
                    .map_err(|e| InterceptError::InstallFailed {
                        asset: url.clone(),
                        reason: e.to_string(),
                    })?;

                if !response.is_success() {
                    return Err(InterceptError::InstallFailed {
                        asset: url,
                        reason: format!("HTTP {}", response.status),
                    });
                }

                Ok((CacheKey::get(url), response))
            }
        });

        let entries = try_join_all(fetches).await?;
        let keys = entries.iter().map(|(key, _)| key.clone()).collect();

        self.storage
            .put_all(self.partitions.static_assets(), entries)
            .await
            .map_err(|e| InterceptError::InstallFailed {
                asset: self.partitions.static_assets().to_string(),
                reason: e.to_string(),
            })?;

        Ok(keys)
    }

    #[instrument(skip(self))]
    async fn activate(&self) -> Result<Vec<String>> {
        self.transition(WorkerState::Installed, WorkerState::Activating, "activate")?;

        let existing = match self.storage.partition_names().await {
            Ok(names) => names,
            Err(error) => {
                warn!(error = %error, "Could not enumerate partitions, skipping purge");
                Vec::new()
            }
        };

        let mut purged = Vec::new();
        for name in existing {
            if self.partitions.is_current(&name) {
                continue;
            }
            match self.storage.delete_partition(&name).await {
                Ok(_) => {
                    debug!(partition = %name, "Purged stale partition");
                    purged.push(name);
                }
                Err(error) => warn!(partition = %name, error = %error, "Purge failed"),
            }
        }

        *self.state.write() = WorkerState::Activated;
        info!(purged = purged.len(), "Worker activated");
        self.emit(LifecycleEvent::Activated {
            purged: purged.clone(),
        });

        Ok(purged)
    }

    /// Answer a request. Until the worker is activated, and for methods
    /// other than GET and HEAD, the request goes straight to the network.
    pub async fn fetch(&self, request: HttpRequest) -> Result<HttpResponse> {
        if self.state() != WorkerState::Activated || !request.method.is_read() {
            return self.strategies.passthrough(request).await;
        }

        match self.classifier.classify(&request.url) {
            RequestClass::Api => self.strategies.stale_while_revalidate(request).await,
            RequestClass::Media => self.strategies.cache_first(request).await,
            RequestClass::Default => self.strategies.network_first(request).await,
        }
    }

    #[instrument(skip(self))]
    async fn sync(&self, tag: String) -> Result<WorkerOutcome> {
        let handler = self.sync_handlers.read().get(&tag).cloned();

        let Some(handler) = handler else {
            debug!(tag = %tag, "No handler for sync tag");
            return Ok(WorkerOutcome::Synced {
                tag,
                handled: false,
            });
        };

        match handler.run().await {
            Ok(()) => {
                self.emit(LifecycleEvent::SyncCompleted { tag: tag.clone() });
                Ok(WorkerOutcome::Synced { tag, handled: true })
            }
            Err(error) => {
                warn!(tag = %tag, error = %error, "Sync handler failed");
                self.emit(LifecycleEvent::SyncFailed {
                    tag: tag.clone(),
                    message: error.to_string(),
                });
                Err(InterceptError::SyncFailed {
                    tag,
                    message: error.to_string(),
                })
            }
        }
    }

    fn transition(&self, from: WorkerState, to: WorkerState, action: &'static str) -> Result<()> {
        let mut state = self.state.write();
        if *state != from {
            return Err(InterceptError::InvalidState {
                state: *state,
                action,
            });
        }
        *state = to;
        Ok(())
    }

    fn emit(&self, event: LifecycleEvent) {
        if let Some(bus) = &self.event_bus {
            // No subscribers is not an error.
            let _ = bus.emit(CoreEvent::Worker(event));
        }
    }
}
