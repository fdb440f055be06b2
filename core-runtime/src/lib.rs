//! # Core Runtime Module
//!
//! Foundational infrastructure shared by the interception worker, the offline
//! store and the service layer:
//! - Logging and tracing setup
//! - Configuration management
//! - Event bus system
//!
//! ## Overview
//!
//! Nothing in this crate touches the network or disk directly; it only wires
//! `tracing`, validates configuration, and broadcasts typed events.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
