//! Metric extraction and reduction.
//!
//! A benchmark executable reports its result somewhere in its standard
//! output as a line matching a family-specific pattern with one capturing
//! group (for example `Time Program = 3.217` or `Nodes/Sec = 1234567.8`).
//! Every match from every trial of a configuration is collected into a
//! single pool, and the pool is reduced once: the minimum for elapsed-time
//! metrics, the maximum for throughput metrics. This mirrors the usual
//! benchmarking convention of keeping the single best result across
//! repeated runs rather than an average.

use clap::ValueEnum;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Direction of a benchmark metric: whether lower or higher extracted
/// values are better. Determines the reduction applied to the sample pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// Elapsed time; lower is better, the pool reduces to its minimum.
    #[clap(name = "time")]
    Time,

    /// Work rate (e.g. nodes per second); higher is better, the pool
    /// reduces to its maximum.
    #[clap(name = "throughput")]
    Throughput,
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricKind::Time => write!(f, "time"),
            MetricKind::Throughput => write!(f, "throughput"),
        }
    }
}

impl MetricKind {
    /// Reduce a pool of extracted samples to the single representative
    /// value for this metric. Returns `None` for an empty pool so that
    /// "no data" stays distinguishable from a measured 0.0.
    pub fn reduce(&self, samples: &[f64]) -> Option<f64> {
        if samples.is_empty() {
            return None;
        }
        let reduced = match self {
            MetricKind::Time => samples.iter().copied().fold(f64::INFINITY, f64::min),
            MetricKind::Throughput => samples.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        };
        Some(reduced)
    }

    /// Generic unit label used when the metric kind is overridden on the
    /// command line and the suite's own unit no longer applies.
    pub fn unit(&self) -> &'static str {
        match self {
            MetricKind::Time => "sec",
            MetricKind::Throughput => "ops/sec",
        }
    }
}

/// Scan captured program output for every non-overlapping match of the
/// scan pattern and parse the captured group of each as `f64`.
///
/// A match whose captured text does not parse as a float (the character
/// class of the default patterns admits strings like `1.2.3`) is skipped
/// rather than failing the trial.
pub fn extract_samples(pattern: &Regex, output: &str) -> Vec<f64> {
    let mut samples = Vec::new();
    for captures in pattern.captures_iter(output) {
        let Some(group) = captures.get(1) else {
            continue;
        };
        match group.as_str().parse::<f64>() {
            Ok(value) => samples.push(value),
            Err(_) => {
                debug!("ignoring unparsable metric candidate: {}", group.as_str());
            }
        }
    }
    samples
}

/// The reduced outcome of one run configuration.
///
/// `value` is `None` when the scan pattern matched zero times across all
/// trials. The report layer renders that as an explicit placeholder; it is
/// never folded into 0.0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateResult {
    /// Variant label: `serial` or a task-variant name.
    pub variant: String,

    /// Thread count for parallel variants, absent for the serial baseline.
    pub threads: Option<usize>,

    /// The reduced metric value, if any sample was extracted.
    pub value: Option<f64>,

    /// Number of samples pooled across all trials before the reduction.
    pub sample_count: usize,
}
