//! # Event Bus System
//!
//! Provides an event-driven architecture for the caching core using
//! `tokio::sync::broadcast`. The interception worker and the offline store
//! publish what they did; hosts subscribe to drive UI such as "saved for
//! offline" badges or an offline banner.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐  emit   ┌───────────┐
//! │ Interception     ├────────>│           │   subscribe   ┌────────────┐
//! │ Worker           │         │ EventBus  ├──────────────>│ Subscriber │
//! └──────────────────┘         │ (broadcast│               └────────────┘
//! ┌──────────────────┐  emit   │  channel) │   subscribe   ┌────────────┐
//! │ Offline Store    ├────────>│           ├──────────────>│ Subscriber │
//! └──────────────────┘         └───────────┘               └────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, OfflineEvent};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let event_bus = EventBus::new(100);
//! let mut subscriber = event_bus.subscribe();
//!
//! event_bus
//!     .emit(CoreEvent::Offline(OfflineEvent::SurahSaved { number: 2 }))
//!     .ok();
//!
//! let event = subscriber.recv().await.unwrap();
//! assert_eq!(event.description(), "Surah saved for offline reading");
//! # }
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: the subscriber missed `n` events. Non-fatal.
//! - **`RecvError::Closed`**: every sender was dropped. Treat as shutdown.
//!
//! Emitting with no subscribers returns `Err`; publishers ignore it with
//! `.ok()` since nobody listening is a normal state.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum encompassing all event categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Interception worker lifecycle and sync
    Worker(WorkerEvent),
    /// Explicit offline saves
    Offline(OfflineEvent),
    /// Connectivity transitions
    Network(NetworkEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Worker(e) => e.description(),
            CoreEvent::Offline(e) => e.description(),
            CoreEvent::Network(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Worker(WorkerEvent::InstallFailed { .. }) => EventSeverity::Error,
            CoreEvent::Worker(WorkerEvent::SyncFailed { .. }) => EventSeverity::Warning,
            CoreEvent::Offline(OfflineEvent::AudioSkipped { .. }) => EventSeverity::Warning,
            CoreEvent::Network(NetworkEvent::WentOffline) => EventSeverity::Warning,
            CoreEvent::Worker(WorkerEvent::Activated { .. }) => EventSeverity::Info,
            CoreEvent::Offline(OfflineEvent::SurahSaved { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Worker Events
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum WorkerEvent {
    /// Every shell asset was fetched and written.
    Installed {
        partition: String,
        asset_count: usize,
    },
    /// Install aborted; nothing was written.
    InstallFailed { message: String },
    /// Worker took control and purged stale partitions.
    Activated { purged: Vec<String> },
    /// Worker was superseded and no longer intercepts.
    Redundant,
    SyncCompleted { tag: String },
    SyncFailed { tag: String, message: String },
}

impl WorkerEvent {
    fn description(&self) -> &str {
        match self {
            WorkerEvent::Installed { .. } => "Worker installed",
            WorkerEvent::InstallFailed { .. } => "Worker install failed",
            WorkerEvent::Activated { .. } => "Worker activated",
            WorkerEvent::Redundant => "Worker became redundant",
            WorkerEvent::SyncCompleted { .. } => "Background sync completed",
            WorkerEvent::SyncFailed { .. } => "Background sync failed",
        }
    }
}

// ============================================================================
// Offline Store Events
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum OfflineEvent {
    SurahSaved { number: u16 },
    SurahDeleted { number: u16 },
    AudioSaved { key: String, size_bytes: u64 },
    /// The source could not be fetched; nothing was stored.
    AudioSkipped { key: String, reason: String },
    /// Removed to stay within the audio byte budget.
    AudioEvicted { key: String, size_bytes: u64 },
}

impl OfflineEvent {
    fn description(&self) -> &str {
        match self {
            OfflineEvent::SurahSaved { .. } => "Surah saved for offline reading",
            OfflineEvent::SurahDeleted { .. } => "Offline surah removed",
            OfflineEvent::AudioSaved { .. } => "Recitation saved for offline listening",
            OfflineEvent::AudioSkipped { .. } => "Recitation could not be downloaded",
            OfflineEvent::AudioEvicted { .. } => "Recitation evicted to free space",
        }
    }
}

// ============================================================================
// Network Events
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum NetworkEvent {
    WentOnline,
    WentOffline,
}

impl NetworkEvent {
    fn description(&self) -> &str {
        match self {
            NetworkEvent::WentOnline => "Connection restored",
            NetworkEvent::WentOffline => "Connection lost",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central broadcast channel for [`CoreEvent`]s.
///
/// Cloning the bus shares the underlying channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified per-subscriber buffer size.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an error
    /// if there are none.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with optional filtering.
///
/// ```rust
/// use core_runtime::events::{CoreEvent, EventBus, EventStream};
///
/// let event_bus = EventBus::default();
/// let offline_only = EventStream::new(event_bus.subscribe())
///     .filter(|event| matches!(event, CoreEvent::Offline(_)));
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only events matching `predicate` are returned by `recv()`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receives the next event that passes the filter.
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n` events.
    /// Returns `RecvError::Closed` if all senders have been dropped.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive an event without blocking.
    ///
    /// Returns `None` if no matching events are currently available.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.accepts(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn saved(number: u16) -> CoreEvent {
        CoreEvent::Offline(OfflineEvent::SurahSaved { number })
    }

    #[tokio::test]
    async fn test_emission_without_subscribers_is_err() {
        let bus = EventBus::new(10);
        assert_eq!(bus.subscriber_count(), 0);
        assert!(bus.emit(saved(1)).is_err());
    }

    #[tokio::test]
    async fn test_multiple_subscribers_receive_same_event() {
        let bus = EventBus::new(10);
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        assert_eq!(bus.emit(saved(2)).unwrap(), 2);
        assert_eq!(first.recv().await.unwrap(), saved(2));
        assert_eq!(second.recv().await.unwrap(), saved(2));
    }

    #[tokio::test]
    async fn test_event_stream_with_filter() {
        let bus = EventBus::new(10);
        let mut stream = EventStream::new(bus.subscribe())
            .filter(|event| matches!(event, CoreEvent::Network(_)));

        bus.emit(saved(3)).unwrap();
        bus.emit(CoreEvent::Network(NetworkEvent::WentOffline))
            .unwrap();

        assert_eq!(
            stream.recv().await.unwrap(),
            CoreEvent::Network(NetworkEvent::WentOffline)
        );
        assert!(stream.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_lagged_subscriber() {
        let bus = EventBus::new(2);
        let mut sub = bus.subscribe();

        for number in 1..=5 {
            bus.emit(saved(number)).ok();
        }

        assert!(matches!(sub.recv().await, Err(RecvError::Lagged(_))));
    }

    #[test]
    fn test_event_severity() {
        let failed = CoreEvent::Worker(WorkerEvent::InstallFailed {
            message: "404".to_string(),
        });
        assert_eq!(failed.severity(), EventSeverity::Error);

        let activated = CoreEvent::Worker(WorkerEvent::Activated { purged: vec![] });
        assert_eq!(activated.severity(), EventSeverity::Info);

        let evicted = CoreEvent::Offline(OfflineEvent::AudioEvicted {
            key: "1-1-alafasy".to_string(),
            size_bytes: 10,
        });
        assert_eq!(evicted.severity(), EventSeverity::Debug);
        assert!(failed.severity() > activated.severity());
    }

    #[test]
    fn test_event_serialization() {
        let event = CoreEvent::Worker(WorkerEvent::Activated {
            purged: vec!["v0-static".to_string()],
        });

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "Worker");
        assert_eq!(json["payload"]["event"], "Activated");
        assert_eq!(json["payload"]["purged"][0], "v0-static");

        let back: CoreEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }
}
