use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Number of comma separated values in a statistics payload.
pub const FIELD_COUNT: usize = 7;

/// One poll cycle's worth of server statistics.
///
/// Wire order: `cpu,total_ram,used_ram,total_disk,used_disk,total_bw,used_bw`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricSnapshot {
    pub cpu_load_average: i64,
    pub total_memory_bytes: i64,
    pub used_memory_bytes: i64,
    pub total_disk_bytes: i64,
    pub used_disk_bytes: i64,
    pub total_bandwidth_bps: i64,
    pub used_bandwidth_bps: i64,
}

/// Position of a value in the statistics payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricField {
    CpuLoadAverage,
    TotalMemoryBytes,
    UsedMemoryBytes,
    TotalDiskBytes,
    UsedDiskBytes,
    TotalBandwidthBps,
    UsedBandwidthBps,
}

impl MetricField {
    /// All fields in wire order.
    pub const ALL: [MetricField; FIELD_COUNT] = [
        MetricField::CpuLoadAverage,
        MetricField::TotalMemoryBytes,
        MetricField::UsedMemoryBytes,
        MetricField::TotalDiskBytes,
        MetricField::UsedDiskBytes,
        MetricField::TotalBandwidthBps,
        MetricField::UsedBandwidthBps,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MetricField::CpuLoadAverage => "cpu_load_average",
            MetricField::TotalMemoryBytes => "total_memory_bytes",
            MetricField::UsedMemoryBytes => "used_memory_bytes",
            MetricField::TotalDiskBytes => "total_disk_bytes",
            MetricField::UsedDiskBytes => "used_disk_bytes",
            MetricField::TotalBandwidthBps => "total_bandwidth_bps",
            MetricField::UsedBandwidthBps => "used_bandwidth_bps",
        }
    }
}

impl fmt::Display for MetricField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("expected 7 values, got {found}")]
    FieldCount { found: usize },

    #[error("failed to parse {field}: {source}")]
    FieldParse {
        field: MetricField,
        #[source]
        source: ParseIntError,
    },
}

impl MetricSnapshot {
    /// Parse a raw statistics payload.
    ///
    /// The text is split on `,` as-is: surrounding whitespace or a trailing
    /// newline makes the affected field fail to parse.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let parts: Vec<&str> = text.split(',').collect();
        if parts.len() != FIELD_COUNT {
            return Err(ParseError::FieldCount { found: parts.len() });
        }

        let mut values = [0i64; FIELD_COUNT];
        for ((slot, raw), field) in values.iter_mut().zip(&parts).zip(MetricField::ALL) {
            *slot = raw
                .parse::<i64>()
                .map_err(|source| ParseError::FieldParse { field, source })?;
        }

        let [
            cpu_load_average,
            total_memory_bytes,
            used_memory_bytes,
            total_disk_bytes,
            used_disk_bytes,
            total_bandwidth_bps,
            used_bandwidth_bps,
        ] = values;

        Ok(Self {
            cpu_load_average,
            total_memory_bytes,
            used_memory_bytes,
            total_disk_bytes,
            used_disk_bytes,
            total_bandwidth_bps,
            used_bandwidth_bps,
        })
    }

    pub fn get(&self, field: MetricField) -> i64 {
        match field {
            MetricField::CpuLoadAverage => self.cpu_load_average,
            MetricField::TotalMemoryBytes => self.total_memory_bytes,
            MetricField::UsedMemoryBytes => self.used_memory_bytes,
            MetricField::TotalDiskBytes => self.total_disk_bytes,
            MetricField::UsedDiskBytes => self.used_disk_bytes,
            MetricField::TotalBandwidthBps => self.total_bandwidth_bps,
            MetricField::UsedBandwidthBps => self.used_bandwidth_bps,
        }
    }
}

impl FromStr for MetricSnapshot {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
