//! Workspace umbrella crate.
//!
//! Host applications can depend on `tilawa-workspace` and pick features
//! instead of wiring each crate individually:
//!
//! - `desktop-shims` (default): the composed [`core_service`] with desktop
//!   bridges (reqwest, SQLite response cache, reachability probe)
//! - `study`: reading plans, streaks and study session state

#[cfg(feature = "desktop-shims")]
pub use core_service;

#[cfg(feature = "study")]
pub use core_study;
