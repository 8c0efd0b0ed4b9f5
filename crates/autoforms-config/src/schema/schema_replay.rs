//! Replay-side configuration: locator resolution, step execution, lookup.

use serde::{Deserialize, Serialize};

/// Locator resolution configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocatorConfig {
    /// Per-query timeout in milliseconds.
    #[serde(default = "default_locator_timeout")]
    pub timeout_ms: u64,

    /// Delay before retrying a strategy that hit a stale element.
    #[serde(default = "default_stale_retry_delay")]
    pub stale_retry_delay_ms: u64,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_locator_timeout(),
            stale_retry_delay_ms: default_stale_retry_delay(),
        }
    }
}

fn default_locator_timeout() -> u64 {
    5000
}

fn default_stale_retry_delay() -> u64 {
    100
}

/// Cookbook replay configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Delay after each successful action unless the step overrides it.
    #[serde(default = "default_settle_delay")]
    pub settle_delay_ms: u64,

    /// Duration of a `wait` step that carries no value.
    #[serde(default = "default_wait")]
    pub default_wait_ms: u64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: default_settle_delay(),
            default_wait_ms: default_wait(),
        }
    }
}

fn default_settle_delay() -> u64 {
    250
}

fn default_wait() -> u64 {
    1000
}

/// Manual lookup configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Maximum number of candidates scanned per lookup.
    #[serde(default = "default_lookup_limit")]
    pub lookup_limit: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            lookup_limit: default_lookup_limit(),
        }
    }
}

fn default_lookup_limit() -> usize {
    10
}
