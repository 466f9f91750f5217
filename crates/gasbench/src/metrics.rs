//! Per-operation gas series and their aggregation.

use serde::Serialize;

/// One gas measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GasSample {
    /// Operation that produced the sample.
    pub operation: &'static str,
    /// Zero-based run index.
    pub run: usize,
    /// Gas consumed.
    pub gas: u64,
}

/// Ordered samples of one operation plus their running sum.
///
/// Append-only: a failed step simply does not push, so `len()` may fall short of the run count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchmarkSeries {
    operation: &'static str,
    samples: Vec<GasSample>,
    sum: u64,
}

impl BenchmarkSeries {
    /// Creates an empty series for `operation`.
    pub const fn new(operation: &'static str) -> Self {
        Self { operation, samples: Vec::new(), sum: 0 }
    }

    /// Operation name.
    pub const fn operation(&self) -> &'static str {
        self.operation
    }

    /// Appends the sample of `run`.
    pub fn record(&mut self, run: usize, gas: u64) {
        self.sum = self.sum.saturating_add(gas);
        self.samples.push(GasSample { operation: self.operation, run, gas });
    }

    /// Samples in recording order.
    pub fn samples(&self) -> &[GasSample] {
        &self.samples
    }

    /// Raw gas values in recording order.
    pub fn values(&self) -> Vec<u64> {
        self.samples.iter().map(|s| s.gas).collect()
    }

    /// Number of recorded samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether no sample was recorded.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sum of all samples.
    pub const fn sum(&self) -> u64 {
        self.sum
    }

    /// Sum divided by the configured run count. Runs without a sample count as zero, so a
    /// failure lowers the average instead of hiding. `None` when `runs` is zero.
    pub fn average(&self, runs: usize) -> Option<f64> {
        (runs > 0).then(|| self.sum as f64 / runs as f64)
    }

    /// Mean over the recorded samples only, `None` when empty.
    pub fn sample_mean(&self) -> Option<f64> {
        (!self.is_empty()).then(|| self.sum as f64 / self.samples.len() as f64)
    }

    /// Summary of the series for reporting over `runs` repetitions.
    pub fn stats(&self, runs: usize) -> OperationStats {
        OperationStats {
            operation: self.operation,
            samples: self.len(),
            total: self.sum,
            average: self.average(runs),
            sample_mean: self.sample_mean(),
            series: self.values(),
            runs: self.samples.iter().map(|s| s.run).collect(),
        }
    }
}

/// Reported figures of one operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationStats {
    /// Operation name.
    pub operation: &'static str,
    /// Number of samples collected.
    pub samples: usize,
    /// Total gas over all samples.
    pub total: u64,
    /// Total gas divided by the configured run count.
    pub average: Option<f64>,
    /// Total gas divided by the number of samples.
    pub sample_mean: Option<f64>,
    /// Raw gas values in run order.
    pub series: Vec<u64>,
    /// Run index of each value in `series`.
    pub runs: Vec<usize>,
}

/// Series of every operation of one protocol, in report order.
///
/// Owned by the orchestrator for one benchmark run and lent to the driver. Each series has a
/// single writer, so no synchronisation is needed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregator {
    runs: usize,
    series: Vec<BenchmarkSeries>,
}

impl Aggregator {
    /// Creates empty series for `operations` over `runs` repetitions.
    pub fn new(runs: usize, operations: &[&'static str]) -> Self {
        Self { runs, series: operations.iter().copied().map(BenchmarkSeries::new).collect() }
    }

    /// Configured repetition count.
    pub const fn runs(&self) -> usize {
        self.runs
    }

    /// Records `gas` for `operation` in `run`. Returns `false`, recording nothing, when
    /// `operation` was not registered.
    pub fn record(&mut self, operation: &'static str, run: usize, gas: u64) -> bool {
        debug_assert!(run < self.runs, "run {run} out of range");
        let Some(series) = self.series_mut(operation) else { return false };
        series.record(run, gas);
        true
    }

    /// The series of `operation`, if registered.
    pub fn series(&self, operation: &str) -> Option<&BenchmarkSeries> {
        self.series.iter().find(|s| s.operation == operation)
    }

    /// Mutable access to the series of `operation`, if registered.
    pub fn series_mut(&mut self, operation: &str) -> Option<&mut BenchmarkSeries> {
        self.series.iter_mut().find(|s| s.operation == operation)
    }

    /// Disjoint mutable access to every series, for concurrent single-writer use.
    pub fn all_series_mut(&mut self) -> &mut [BenchmarkSeries] {
        &mut self.series
    }

    /// Summaries of every series in registration order.
    pub fn stats(&self) -> Vec<OperationStats> {
        self.series.iter().map(|series| series.stats(self.runs)).collect()
    }
}
