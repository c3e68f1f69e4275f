//! Result collection, report rendering, and JSON output.
//!
//! Results are kept in planning order and the report reproduces exactly
//! that order: a unit header, the thread-count summary line, then one
//! section per variant with one value line per thread count. A
//! configuration whose trials never matched the scan pattern renders as
//! `n/a` so missing data is never mistaken for a measured zero.

use crate::{metrics::AggregateResult, planner::BenchmarkConfig};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::info;

/// Placeholder printed for a configuration with no extracted samples.
const NO_DATA: &str = "n/a";

/// Ordered sweep results plus everything needed to render and export them.
pub struct SweepResults {
    config_summary: ConfigSummary,
    unit: String,
    threads: Vec<usize>,
    rows: Vec<AggregateResult>,
    started: Instant,
}

impl SweepResults {
    /// Create an empty result set for a resolved configuration.
    pub fn new(config: &BenchmarkConfig) -> Self {
        Self {
            config_summary: ConfigSummary::from_config(config),
            unit: config.unit.clone(),
            threads: config.threads.clone(),
            rows: Vec::new(),
            started: Instant::now(),
        }
    }

    /// Append one configuration's aggregate, preserving insertion order.
    pub fn push(&mut self, result: AggregateResult) {
        self.rows.push(result);
    }

    /// Number of configurations recorded so far.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when no configuration has completed yet.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Recorded rows, in report order.
    pub fn rows(&self) -> &[AggregateResult] {
        &self.rows
    }

    /// Write the JSON results document.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let document = ResultsDocument {
            metadata: Metadata {
                version: crate::VERSION.to_string(),
                timestamp: chrono::Utc::now(),
                elapsed: self.started.elapsed(),
                system_info: SystemInfo::collect(),
            },
            config: self.config_summary.clone(),
            results: self.rows.clone(),
        };

        let json = serde_json::to_string_pretty(&document)?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write results to {}", path.display()))?;
        info!("results written to {}", path.display());
        Ok(())
    }
}

impl fmt::Display for SweepResults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "unit: {}", self.unit)?;
        let threads: Vec<String> = self.threads.iter().map(|n| n.to_string()).collect();
        writeln!(f, "# of threads: {}", threads.join(" "))?;

        let mut current_section: Option<&str> = None;
        for row in &self.rows {
            if current_section != Some(row.variant.as_str()) {
                writeln!(f)?;
                writeln!(f, "{}", row.variant)?;
                current_section = Some(row.variant.as_str());
            }
            match row.value {
                Some(value) => writeln!(f, "{}", value)?,
                None => writeln!(f, "{}", NO_DATA)?,
            }
        }
        Ok(())
    }
}

/// Echo of the resolved configuration, for reproducibility of the JSON
/// document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSummary {
    pub suite: crate::cli::Suite,
    pub workload: String,
    pub label: String,
    pub threads: Vec<usize>,
    pub trials: usize,
    pub variants: Vec<String>,
    pub skip_serial: bool,
    pub metric: crate::metrics::MetricKind,
    pub unit: String,
    pub pattern: String,
    pub numa: bool,
    pub stack_size_kb: u64,
}

impl ConfigSummary {
    fn from_config(config: &BenchmarkConfig) -> Self {
        Self {
            suite: config.suite,
            workload: config.workload.clone(),
            label: config.label.clone(),
            threads: config.threads.clone(),
            trials: config.trials,
            variants: config.variants.iter().map(|v| v.label.clone()).collect(),
            skip_serial: config.skip_serial,
            metric: config.metric,
            unit: config.unit.clone(),
            pattern: config.pattern.clone(),
            numa: config.numa,
            stack_size_kb: config.stack_size_kb,
        }
    }
}

/// Top-level JSON results document.
#[derive(Debug, Serialize, Deserialize)]
pub struct ResultsDocument {
    pub metadata: Metadata,
    pub config: ConfigSummary,
    pub results: Vec<AggregateResult>,
}

/// Sweep metadata for the JSON document.
#[derive(Debug, Serialize, Deserialize)]
pub struct Metadata {
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub elapsed: Duration,
    pub system_info: SystemInfo,
}

/// Host information recorded for reproducibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInfo {
    pub os: String,
    pub architecture: String,
    pub cpu_cores: usize,
    pub driver_version: String,
}

impl SystemInfo {
    fn collect() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            architecture: std::env::consts::ARCH.to_string(),
            cpu_cores: num_cpus::get(),
            driver_version: crate::VERSION.to_string(),
        }
    }
}
