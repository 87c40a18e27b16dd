//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;

use crate::store::DEFAULT_BUDGET_BYTES;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Byte budget of the document store
    pub budget_bytes: usize,
    /// HTTP server port
    pub server_port: u16,
    /// Capacity monitor interval in seconds
    pub monitor_interval: u64,
    /// Usage percentage above which the monitor warns
    pub capacity_warn_percent: u8,
    /// Base URL of the remote metadata API
    pub metadata_api_url: Option<String>,
    /// Bearer token for the remote metadata API
    pub metadata_api_key: Option<String>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `STORE_BUDGET_BYTES` - Store byte budget (default: 5 MiB)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `MONITOR_INTERVAL` - Capacity check frequency in seconds (default: 30)
    /// - `CAPACITY_WARN_PERCENT` - Usage warning threshold (default: 80)
    /// - `METADATA_API_URL` - Remote metadata API base URL (optional)
    /// - `METADATA_API_KEY` - Remote metadata API token (optional)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            budget_bytes: parse_var("STORE_BUDGET_BYTES").unwrap_or(defaults.budget_bytes),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            monitor_interval: parse_var("MONITOR_INTERVAL").unwrap_or(defaults.monitor_interval),
            capacity_warn_percent: parse_var("CAPACITY_WARN_PERCENT")
                .unwrap_or(defaults.capacity_warn_percent),
            metadata_api_url: non_empty_var("METADATA_API_URL"),
            metadata_api_key: non_empty_var("METADATA_API_KEY"),
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            budget_bytes: DEFAULT_BUDGET_BYTES,
            server_port: 3000,
            monitor_interval: 30,
            capacity_warn_percent: 80,
            metadata_api_url: None,
            metadata_api_key: None,
        }
    }
}
