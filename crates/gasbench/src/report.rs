//! Final benchmark report.
//!
//! Text rendering goes through [`fmt::Display`]; JSON through `serde`. Both carry, per
//! operation, the total, the average over all runs, the mean over collected samples, the sample
//! count and the raw run-indexed series.

use core::fmt;

use serde::Serialize;

use crate::{
    gas::GasSource,
    metrics::{Aggregator, OperationStats},
    protocols::Protocol,
};

/// Aggregated results of one protocol.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProtocolReport {
    /// The benchmarked protocol.
    pub protocol: Protocol,
    /// Where gas figures were read from.
    pub gas_source: GasSource,
    /// Per-operation figures, in report order.
    pub operations: Vec<OperationStats>,
}

impl ProtocolReport {
    /// Summarises the series collected in `metrics`.
    pub fn new(protocol: Protocol, gas_source: GasSource, metrics: &Aggregator) -> Self {
        Self { protocol, gas_source, operations: metrics.stats() }
    }

    /// Figures of `operation`, if reported.
    pub fn operation(&self, operation: &str) -> Option<&OperationStats> {
        self.operations.iter().find(|s| s.operation == operation)
    }
}

/// Results of a whole benchmark invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    /// Configured repetition count.
    pub runs: usize,
    /// One entry per benchmarked protocol, in selection order.
    pub protocols: Vec<ProtocolReport>,
}

impl Report {
    /// Results of `protocol`, if it was benchmarked.
    pub fn protocol(&self, protocol: Protocol) -> Option<&ProtocolReport> {
        self.protocols.iter().find(|p| p.protocol == protocol)
    }

    /// Pretty-printed JSON rendering.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, protocol) in self.protocols.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            writeln!(f, "=== {} ({} gas) ===", protocol.protocol, protocol.gas_source)?;
            for stats in &protocol.operations {
                write_operation(f, stats, self.runs)?;
            }
        }
        Ok(())
    }
}

fn write_operation(f: &mut fmt::Formatter<'_>, stats: &OperationStats, runs: usize) -> fmt::Result {
    writeln!(f, "{}:", stats.operation)?;
    writeln!(f, "  Samples:  {}/{}", stats.samples, runs)?;
    writeln!(f, "  Total:    {}", stats.total)?;
    writeln!(f, "  Average:  {}", fmt_gas(stats.average))?;
    writeln!(f, "  Mean:     {}", fmt_gas(stats.sample_mean))?;
    let series = stats.series.iter().map(u64::to_string).collect::<Vec<_>>().join(", ");
    writeln!(f, "  Series:   [{series}]")
}

fn fmt_gas(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |value| format!("{value:.2}"))
}
