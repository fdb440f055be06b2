//! # Interception Error Types

use bridge_traits::BridgeError;
use thiserror::Error;

use crate::worker::WorkerState;

#[derive(Error, Debug)]
pub enum InterceptError {
    // ========================================================================
    // Lifecycle
    // ========================================================================
    /// A shell asset could not be fetched; nothing was cached.
    #[error("Install failed on {asset}: {reason}")]
    InstallFailed { asset: String, reason: String },

    /// The requested lifecycle step is not valid from the current state.
    #[error("Cannot {action} while worker is {state:?}")]
    InvalidState {
        state: WorkerState,
        action: &'static str,
    },

    // ========================================================================
    // Request handling
    // ========================================================================
    /// Transport or cache storage failure surfaced by a bridge.
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    // ========================================================================
    // Background sync
    // ========================================================================
    #[error("Sync '{tag}' failed: {message}")]
    SyncFailed { tag: String, message: String },

    // ========================================================================
    // Configuration
    // ========================================================================
    #[error("Invalid interception config: {0}")]
    InvalidConfig(String),
}

impl InterceptError {
    /// Whether the failure came from the network rather than local state.
    pub fn is_network(&self) -> bool {
        matches!(self, InterceptError::Bridge(e) if e.is_network())
    }
}

pub type Result<T> = std::result::Result<T, InterceptError>;
