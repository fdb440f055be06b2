//! # Network Interception Layer
//!
//! A request-intercepting worker that owns three versioned cache partitions
//! (`static`, `api`, `media`) and answers requests with a caching policy
//! chosen per request.
//!
//! ## Overview
//!
//! - **Lifecycle**: install precaches the app shell atomically, activation
//!   purges partitions left by older versions.
//! - **Classification**: content API hosts, audio media, everything else.
//! - **Policies**: stale-while-revalidate, cache-first and network-first with
//!   an offline fallback.
//!
//! Storage and transport are injected through the
//! [`CacheStorage`](bridge_traits::CacheStorage) and
//! [`HttpClient`](bridge_traits::HttpClient) bridges.

pub mod classify;
pub mod config;
pub mod error;
pub mod partition;
mod strategy;
pub mod sync;
pub mod worker;

pub use classify::{Classifier, RequestClass};
pub use config::InterceptConfig;
pub use error::{InterceptError, Result};
pub use partition::{PartitionKind, PartitionNames};
pub use sync::SyncHandler;
pub use worker::{InterceptionWorker, WorkerEvent, WorkerOutcome, WorkerState};
