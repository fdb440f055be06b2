//! # Structured Offline Store
//!
//! Versioned SQLite storage for surahs and recitations the user explicitly
//! saved for offline use, plus connectivity observation.
//!
//! This store is independent of the interception layer's response cache: a
//! resource can live in either, both or neither.

pub mod config;
pub mod connectivity;
pub mod db;
pub mod error;
pub mod models;
pub mod store;

pub use config::OfflineStoreConfig;
pub use connectivity::{ConnectivitySubscription, ConnectivityWatcher};
pub use error::{OfflineError, Result};
pub use models::{AudioHandle, AudioKey, Ayah, RevelationType, SavedSurah, Surah, SURAH_COUNT};
pub use store::OfflineStore;
