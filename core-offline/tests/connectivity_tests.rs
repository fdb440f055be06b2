use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bridge_traits::{
    BridgeError, NetworkChangeStream, NetworkInfo, NetworkMonitor, NetworkStatus,
};
use core_offline::ConnectivityWatcher;
use core_runtime::events::{CoreEvent, EventBus, NetworkEvent};
use tokio::sync::mpsc;

/// Monitor whose status and transitions are driven by the test.
struct ScriptedMonitor {
    status: Mutex<Option<NetworkStatus>>,
    changes: Mutex<Option<mpsc::UnboundedReceiver<NetworkInfo>>>,
}

struct ChannelStream(mpsc::UnboundedReceiver<NetworkInfo>);

#[async_trait]
impl NetworkChangeStream for ChannelStream {
    async fn next(&mut self) -> Option<NetworkInfo> {
        self.0.recv().await
    }
}

#[async_trait]
impl NetworkMonitor for ScriptedMonitor {
    async fn get_network_info(&self) -> bridge_traits::Result<NetworkInfo> {
        match *self.status.lock().unwrap() {
            Some(status) => Ok(NetworkInfo::new(status)),
            None => Err(BridgeError::NotAvailable("no network API".to_string())),
        }
    }

    async fn subscribe_changes(&self) -> bridge_traits::Result<Box<dyn NetworkChangeStream>> {
        let receiver = self
            .changes
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| BridgeError::OperationFailed("already subscribed".to_string()))?;
        Ok(Box::new(ChannelStream(receiver)))
    }
}

fn scripted(
    status: Option<NetworkStatus>,
) -> (Arc<ScriptedMonitor>, mpsc::UnboundedSender<NetworkInfo>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    let monitor = Arc::new(ScriptedMonitor {
        status: Mutex::new(status),
        changes: Mutex::new(Some(receiver)),
    });
    (monitor, sender)
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

#[tokio::test]
async fn test_is_online_reflects_monitor() {
    let (monitor, _sender) = scripted(Some(NetworkStatus::Disconnected));
    let watcher = ConnectivityWatcher::new(monitor.clone());
    assert!(!watcher.is_online().await);

    *monitor.status.lock().unwrap() = Some(NetworkStatus::Indeterminate);
    assert!(watcher.is_online().await);

    *monitor.status.lock().unwrap() = None;
    assert!(watcher.is_online().await);
}

#[tokio::test]
async fn test_callbacks_fire_on_transitions_only() {
    let (monitor, sender) = scripted(Some(NetworkStatus::Connected));
    let bus = EventBus::new(8);
    let mut events = bus.subscribe();
    let watcher = ConnectivityWatcher::new(monitor).with_event_bus(bus);

    let online = Arc::new(AtomicUsize::new(0));
    let offline = Arc::new(AtomicUsize::new(0));
    let (on, off) = (online.clone(), offline.clone());
    let subscription = watcher
        .register(
            move || {
                on.fetch_add(1, Ordering::SeqCst);
            },
            move || {
                off.fetch_add(1, Ordering::SeqCst);
            },
        )
        .await
        .unwrap();
    assert!(subscription.is_active());

    sender.send(NetworkInfo::new(NetworkStatus::Connected)).unwrap();
    sender.send(NetworkInfo::new(NetworkStatus::Disconnected)).unwrap();
    sender.send(NetworkInfo::new(NetworkStatus::Connected)).unwrap();
    settle().await;

    assert_eq!(online.load(Ordering::SeqCst), 1);
    assert_eq!(offline.load(Ordering::SeqCst), 1);
    assert_eq!(
        events.recv().await.unwrap(),
        CoreEvent::Network(NetworkEvent::WentOffline)
    );
    assert_eq!(
        events.recv().await.unwrap(),
        CoreEvent::Network(NetworkEvent::WentOnline)
    );

    watcher.unregister(subscription);
}

#[tokio::test]
async fn test_unregister_releases_both_callbacks() {
    let (monitor, sender) = scripted(Some(NetworkStatus::Connected));
    let watcher = ConnectivityWatcher::new(monitor);

    let calls = Arc::new(AtomicUsize::new(0));
    let (a, b) = (calls.clone(), calls.clone());
    let subscription = watcher
        .register(
            move || {
                a.fetch_add(1, Ordering::SeqCst);
            },
            move || {
                b.fetch_add(1, Ordering::SeqCst);
            },
        )
        .await
        .unwrap();

    watcher.unregister(subscription);
    settle().await;

    // The receiving task is gone, so sends may fail; either way nothing runs.
    let _ = sender.send(NetworkInfo::new(NetworkStatus::Disconnected));
    let _ = sender.send(NetworkInfo::new(NetworkStatus::Connected));
    settle().await;

    assert_eq!(calls.load(Ordering::SeqCst), 0);
}
