//! Threshold checks over a [`MetricSnapshot`].
//!
//! Each check is evaluated independently into a [`CheckResult`]; the
//! [`Report`] keeps them in a fixed order (cpu, memory, disk, bandwidth)
//! and renders the triggered ones as newline terminated lines.

use std::fmt;

use crate::config::MonitorConfig;
use crate::metrics::MetricSnapshot;

const BYTES_PER_MB: i64 = 1024 * 1024;
const BITS_PER_MBIT: i64 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckKind {
    Cpu,
    Memory,
    Disk,
    Bandwidth,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub kind: CheckKind,
    pub triggered: bool,
    pub message: String,
}

impl CheckResult {
    fn triggered(kind: CheckKind, message: String) -> Self {
        Self {
            kind,
            triggered: true,
            message,
        }
    }

    fn clear(kind: CheckKind) -> Self {
        Self {
            kind,
            triggered: false,
            message: String::new(),
        }
    }
}

/// `floor(used / total * 100)` computed exactly.
///
/// Returns `None` for a zero total so callers skip the check.
pub fn usage_percent(used: i64, total: i64) -> Option<i64> {
    if total == 0 {
        return None;
    }
    let num = i128::from(used) * 100;
    let den = i128::from(total);
    let mut q = num / den;
    if num % den != 0 && (num < 0) != (den < 0) {
        q -= 1;
    }
    Some(i64::try_from(q).unwrap_or(if q > 0 { i64::MAX } else { i64::MIN }))
}

pub fn check_cpu(snapshot: &MetricSnapshot, config: &MonitorConfig) -> CheckResult {
    if snapshot.cpu_load_average >= config.cpu_threshold {
        CheckResult::triggered(
            CheckKind::Cpu,
            format!("Load Average is too high: {}", snapshot.cpu_load_average),
        )
    } else {
        CheckResult::clear(CheckKind::Cpu)
    }
}

pub fn check_memory(snapshot: &MetricSnapshot, config: &MonitorConfig) -> CheckResult {
    match usage_percent(snapshot.used_memory_bytes, snapshot.total_memory_bytes) {
        Some(percent) if percent >= config.memory_percent_threshold => CheckResult::triggered(
            CheckKind::Memory,
            format!("Memory usage too high: {percent}%"),
        ),
        _ => CheckResult::clear(CheckKind::Memory),
    }
}

pub fn check_disk(snapshot: &MetricSnapshot, config: &MonitorConfig) -> CheckResult {
    match usage_percent(snapshot.used_disk_bytes, snapshot.total_disk_bytes) {
        Some(percent) if percent >= config.disk_percent_threshold => {
            let free_mb = snapshot
                .total_disk_bytes
                .saturating_sub(snapshot.used_disk_bytes)
                / BYTES_PER_MB;
            CheckResult::triggered(
                CheckKind::Disk,
                format!("Free disk space is too low: {free_mb} Mb left"),
            )
        }
        _ => CheckResult::clear(CheckKind::Disk),
    }
}

pub fn check_bandwidth(snapshot: &MetricSnapshot, config: &MonitorConfig) -> CheckResult {
    match usage_percent(snapshot.used_bandwidth_bps, snapshot.total_bandwidth_bps) {
        Some(percent) if percent >= config.bandwidth_percent_threshold => {
            let free_mbit = snapshot
                .total_bandwidth_bps
                .saturating_sub(snapshot.used_bandwidth_bps)
                / BITS_PER_MBIT;
            CheckResult::triggered(
                CheckKind::Bandwidth,
                format!("Network bandwidth usage high: {free_mbit} Mbit/s available"),
            )
        }
        _ => CheckResult::clear(CheckKind::Bandwidth),
    }
}

/// Outcome of all checks for one snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub checks: Vec<CheckResult>,
}

impl Report {
    pub fn is_empty(&self) -> bool {
        !self.checks.iter().any(|c| c.triggered)
    }

    pub fn triggered(&self) -> impl Iterator<Item = &CheckResult> {
        self.checks.iter().filter(|c| c.triggered)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for check in self.triggered() {
            writeln!(f, "{}", check.message)?;
        }
        Ok(())
    }
}

pub fn evaluate(snapshot: &MetricSnapshot, config: &MonitorConfig) -> Report {
    Report {
        checks: vec![
            check_cpu(snapshot, config),
            check_memory(snapshot, config),
            check_disk(snapshot, config),
            check_bandwidth(snapshot, config),
        ],
    }
}
