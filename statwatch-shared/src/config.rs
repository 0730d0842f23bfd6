use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_CPU_THRESHOLD: i64 = 30;
pub const DEFAULT_MEMORY_PERCENT_THRESHOLD: i64 = 80;
pub const DEFAULT_DISK_PERCENT_THRESHOLD: i64 = 90;
pub const DEFAULT_BANDWIDTH_PERCENT_THRESHOLD: i64 = 90;
pub const DEFAULT_FAILURE_COUNT_THRESHOLD: u32 = 3;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

/// Alert thresholds and loop timing for a single monitor.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct MonitorConfig {
    /// Load average at or above which the CPU check fires.
    pub cpu_threshold: i64,
    pub memory_percent_threshold: i64,
    pub disk_percent_threshold: i64,
    pub bandwidth_percent_threshold: i64,
    /// Consecutive failed polls before the "unreachable" warning.
    pub failure_count_threshold: u32,
    pub poll_interval_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        MonitorConfig {
            cpu_threshold: DEFAULT_CPU_THRESHOLD,
            memory_percent_threshold: DEFAULT_MEMORY_PERCENT_THRESHOLD,
            disk_percent_threshold: DEFAULT_DISK_PERCENT_THRESHOLD,
            bandwidth_percent_threshold: DEFAULT_BANDWIDTH_PERCENT_THRESHOLD,
            failure_count_threshold: DEFAULT_FAILURE_COUNT_THRESHOLD,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl MonitorConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
