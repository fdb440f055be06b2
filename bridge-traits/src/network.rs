//! Network Monitoring Abstraction
//!
//! Provides the connectivity flag and a stream of online/offline transitions.

use chrono::{DateTime, Utc};

use crate::error::Result;

/// Network connection type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkType {
    /// Cellular/mobile data connection
    Cellular,
    /// WiFi connection
    WiFi,
    /// Ethernet connection
    Ethernet,
    /// Other or unknown connection type
    Other,
}

/// Network connection status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkStatus {
    /// Connected to network
    Connected,
    /// Not connected to any network
    Disconnected,
    /// Connection status unknown or indeterminate
    Indeterminate,
}

impl NetworkStatus {
    /// Indeterminate counts as online, matching how browsers report
    /// `navigator.onLine` when they cannot tell.
    pub fn is_online(&self) -> bool {
        !matches!(self, NetworkStatus::Disconnected)
    }
}

/// Network information
#[derive(Debug, Clone)]
pub struct NetworkInfo {
    pub status: NetworkStatus,
    pub network_type: Option<NetworkType>,
    pub observed_at: DateTime<Utc>,
}

impl NetworkInfo {
    pub fn new(status: NetworkStatus) -> Self {
        Self {
            status,
            network_type: None,
            observed_at: Utc::now(),
        }
    }
}

/// Network monitor trait
///
/// # Platform Support
///
/// - **Desktop**: periodic reachability probe
/// - **Web**: `navigator.onLine` plus `online`/`offline` events
#[async_trait::async_trait]
pub trait NetworkMonitor: Send + Sync {
    /// Get current network information
    async fn get_network_info(&self) -> Result<NetworkInfo>;

    /// Check if currently connected to any network
    async fn is_connected(&self) -> bool {
        match self.get_network_info().await {
            Ok(info) => info.status.is_online(),
            Err(_) => false,
        }
    }

    /// Subscribe to network status changes
    ///
    /// Implementations emit an item only when the status actually changes.
    async fn subscribe_changes(&self) -> Result<Box<dyn NetworkChangeStream>>;
}

/// Stream of network status changes
#[async_trait::async_trait]
pub trait NetworkChangeStream: Send {
    /// Get the next network info update
    ///
    /// Returns `None` when the stream is closed.
    async fn next(&mut self) -> Option<NetworkInfo>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_info() {
        let info = NetworkInfo {
            status: NetworkStatus::Connected,
            network_type: Some(NetworkType::WiFi),
            observed_at: Utc::now(),
        };

        assert_eq!(info.status, NetworkStatus::Connected);
        assert_eq!(info.network_type, Some(NetworkType::WiFi));
    }

    #[test]
    fn test_online_flag() {
        assert!(NetworkStatus::Connected.is_online());
        assert!(NetworkStatus::Indeterminate.is_online());
        assert!(!NetworkStatus::Disconnected.is_online());
    }
}
