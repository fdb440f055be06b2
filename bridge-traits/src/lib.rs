//! # Host Bridge Traits
//!
//! Platform abstraction traits that each host must implement for the offline
//! caching core.
//!
//! ## Overview
//!
//! The caching core never talks to the network, the disk or the system clock
//! directly. Every such capability is a trait defined here and injected as an
//! `Arc<dyn Trait>`, so the same interception and store logic runs on desktop,
//! in a browser shell, or against in-memory fakes in tests.
//!
//! ## Traits
//!
//! ### Networking
//! - [`HttpClient`](http::HttpClient) - Fetch primitive used by every cache policy
//! - [`NetworkMonitor`](network::NetworkMonitor) - Online flag and transition stream
//!
//! ### Storage
//! - [`CacheStorage`](cache::CacheStorage) - Named partitions of cached responses
//! - [`StorageEstimator`](quota::StorageEstimator) - Usage/quota accounting
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic save stamps
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Fail-Fast Strategy
//!
//! The core fails fast with a descriptive error when a required capability is
//! missing:
//!
//! ```ignore
//! let cache_storage = builder.cache_storage.ok_or_else(|| Error::CapabilityMissing {
//!     capability: "CacheStorage".to_string(),
//!     message: "Desktop: enable the desktop-shims feature. \
//!               Web: inject the Cache API adapter.".to_string(),
//! })?;
//! ```
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so they can be shared across the
//! detached tasks the interception layer spawns for background revalidation.

pub mod cache;
pub mod error;
pub mod http;
pub mod network;
pub mod quota;
pub mod time;

pub use cache::{CacheKey, CacheStorage};
pub use error::{BridgeError, Result};
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RequestMode, RetryPolicy};
pub use network::{NetworkChangeStream, NetworkInfo, NetworkMonitor, NetworkStatus, NetworkType};
pub use quota::{StorageEstimate, StorageEstimator};
pub use time::{Clock, LogEntry, LogLevel, LoggerSink, ManualClock, SystemClock};
