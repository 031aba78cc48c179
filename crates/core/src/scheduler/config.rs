//! Scheduler configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the periodic popular sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Enable/disable the scheduler.
    /// When disabled, syncs only run when triggered via the API.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Seconds between scheduled runs.
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    /// Run once immediately instead of waiting a full interval.
    #[serde(default)]
    pub run_on_startup: bool,
}

fn default_enabled() -> bool {
    true
}

fn default_interval() -> u64 {
    86_400 // daily
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            interval_secs: default_interval(),
            run_on_startup: false,
        }
    }
}
