//! Sync job configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the sync job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Pause between consecutive items (milliseconds).
    /// Keeps the detail fetches under the provider's rate limit.
    #[serde(default = "default_throttle_delay")]
    pub throttle_delay_ms: u64,

    /// Listing pages walked by a popular sync when the caller does not say.
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// How many times a rate-limited detail fetch is retried.
    #[serde(default = "default_rate_limit_retries")]
    pub rate_limit_retries: u32,

    /// Wait before retrying a rate-limited fetch when the provider sends no
    /// `Retry-After` (milliseconds).
    #[serde(default = "default_rate_limit_backoff")]
    pub rate_limit_backoff_ms: u64,

    /// Upper bound on any single rate-limit wait, including a provider's
    /// `Retry-After` (milliseconds).
    #[serde(default = "default_max_retry_wait")]
    pub max_retry_wait_ms: u64,
}

fn default_throttle_delay() -> u64 {
    1000 // 1 second
}

fn default_max_pages() -> u32 {
    5
}

fn default_rate_limit_retries() -> u32 {
    2
}

fn default_rate_limit_backoff() -> u64 {
    10_000 // 10 seconds
}

fn default_max_retry_wait() -> u64 {
    60_000 // 1 minute
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            throttle_delay_ms: default_throttle_delay(),
            max_pages: default_max_pages(),
            rate_limit_retries: default_rate_limit_retries(),
            rate_limit_backoff_ms: default_rate_limit_backoff(),
            max_retry_wait_ms: default_max_retry_wait(),
        }
    }
}
