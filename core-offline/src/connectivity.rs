//! Connectivity observation
//!
//! Wraps a [`NetworkMonitor`] so callers can read the current online flag and
//! register a pair of transition callbacks that are released together.

use std::sync::Arc;

use bridge_traits::NetworkMonitor;
use core_runtime::events::{CoreEvent, EventBus, NetworkEvent};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::Result;

pub struct ConnectivityWatcher {
    monitor: Arc<dyn NetworkMonitor>,
    event_bus: Option<EventBus>,
}

impl ConnectivityWatcher {
    pub fn new(monitor: Arc<dyn NetworkMonitor>) -> Self {
        Self {
            monitor,
            event_bus: None,
        }
    }

    /// Also publish each transition as a [`NetworkEvent`].
    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// A monitor that cannot answer is treated as online, like an
    /// indeterminate status.
    pub async fn is_online(&self) -> bool {
        match self.monitor.get_network_info().await {
            Ok(info) => info.status.is_online(),
            Err(error) => {
                warn!(error = %error, "Network status unavailable, assuming online");
                true
            }
        }
    }

    /// Invoke `on_online` / `on_offline` on every connectivity transition
    /// until the returned subscription is dropped or passed to
    /// [`unregister`](Self::unregister).
    ///
    /// Must be called within a Tokio runtime.
    pub async fn register<F, G>(&self, on_online: F, on_offline: G) -> Result<ConnectivitySubscription>
    where
        F: Fn() + Send + Sync + 'static,
        G: Fn() + Send + Sync + 'static,
    {
        let mut stream = self.monitor.subscribe_changes().await?;
        let mut online = self.is_online().await;
        let event_bus = self.event_bus.clone();

        let task = tokio::spawn(async move {
            while let Some(info) = stream.next().await {
                let now_online = info.status.is_online();
                if now_online == online {
                    continue;
                }
                online = now_online;

                let event = if now_online {
                    debug!("Connectivity restored");
                    on_online();
                    NetworkEvent::WentOnline
                } else {
                    debug!("Connectivity lost");
                    on_offline();
                    NetworkEvent::WentOffline
                };

                if let Some(bus) = &event_bus {
                    let _ = bus.emit(CoreEvent::Network(event));
                }
            }
        });

        Ok(ConnectivitySubscription { task: Some(task) })
    }

    /// Release both callbacks of a registration.
    pub fn unregister(&self, subscription: ConnectivitySubscription) {
        drop(subscription);
    }
}

/// Keeps a pair of connectivity callbacks alive. Dropping it releases both.
pub struct ConnectivitySubscription {
    task: Option<JoinHandle<()>>,
}

impl ConnectivitySubscription {
    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for ConnectivitySubscription {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
