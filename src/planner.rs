//! Run planning: expansion of a validated configuration into the ordered
//! list of concrete invocations a sweep will execute.
//!
//! The planner is a pure function of its input. It performs no I/O and
//! spawns nothing; re-planning the same configuration yields an identical
//! sequence. Report order is planning order: the serial baseline first
//! (unless skipped), then each requested task variant swept over the
//! thread counts exactly as the caller listed them.

use crate::{
    cli::{Args, Suite},
    error::HarnessError,
    metrics::MetricKind,
};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A task variant selected for the sweep: the label under which it is
/// reported and the suffix selecting its executable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskVariant {
    /// Report label, e.g. `untied` or `single-tied`.
    pub label: String,

    /// Executable-name suffix, e.g. `omp-tasks` or `single-omp-tasks-tied`.
    pub suffix: String,
}

/// Fully resolved sweep configuration.
///
/// Produced from CLI arguments by [`BenchmarkConfig::from_args`], which is
/// the single place where suite defaults, overrides, and validation meet.
/// Everything downstream treats this structure as authoritative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    /// The benchmark suite being driven.
    pub suite: Suite,

    /// Workload identifier substituted into the program arguments.
    pub workload: String,

    /// Executable label (`<suite>.<label>.<suffix>`), typically the
    /// compiler that produced the binaries.
    pub label: String,

    /// Directory holding the benchmark executables.
    pub bin_dir: PathBuf,

    /// Program arguments, fully resolved for the chosen workload. The same
    /// arguments are passed to every variant including the serial baseline.
    pub program_args: Vec<String>,

    /// Thread counts in report order, preserved verbatim from the caller.
    pub threads: Vec<usize>,

    /// Number of trials per run configuration.
    pub trials: usize,

    /// Whether to skip the serial baseline.
    pub skip_serial: bool,

    /// Selected task variants in report order.
    pub variants: Vec<TaskVariant>,

    /// Metric direction controlling the reduction.
    pub metric: MetricKind,

    /// Output-scan pattern with exactly one capturing group.
    pub pattern: String,

    /// Unit label for the report header.
    pub unit: String,

    /// Whether to prefix invocations with the NUMA interleave command.
    pub numa: bool,

    /// Stack size limit applied to benchmark processes, in KiB.
    pub stack_size_kb: u64,

    /// `OMP_WAIT_POLICY` exported to benchmark processes, if any.
    pub wait_policy: Option<String>,
}

impl BenchmarkConfig {
    /// Resolve CLI arguments against the suite's defaults and validate the
    /// result.
    pub fn from_args(args: &Args) -> Result<Self> {
        let suite = args.suite;

        let workload = args
            .workload
            .clone()
            .unwrap_or_else(|| suite.default_workload().to_string());
        if workload.is_empty() {
            return Err(HarnessError::config("workload must not be empty"));
        }

        let label = args.label.clone();
        if label.is_empty() {
            return Err(HarnessError::config("executable label must not be empty"));
        }

        let program_args = resolve_program_args(suite, &workload, &args.input_dir)?;

        let variants = match &args.variants {
            // Caller-specified selection, kept in caller order.
            Some(labels) => labels
                .iter()
                .map(|label| {
                    suite
                        .variant_suffix(label)
                        .map(|suffix| TaskVariant {
                            label: label.clone(),
                            suffix: suffix.to_string(),
                        })
                        .ok_or_else(|| {
                            HarnessError::Configuration(format!(
                                "unknown variant `{}` for suite {} (known: {})",
                                label,
                                suite,
                                suite
                                    .variants()
                                    .iter()
                                    .map(|(name, _)| *name)
                                    .collect::<Vec<_>>()
                                    .join(", ")
                            ))
                        })
                })
                .collect::<Result<Vec<_>, _>>()?,
            None => suite
                .variants()
                .iter()
                .map(|(label, suffix)| TaskVariant {
                    label: (*label).to_string(),
                    suffix: (*suffix).to_string(),
                })
                .collect(),
        };

        let metric = args.metric.unwrap_or_else(|| suite.metric());
        let unit = if args.metric.is_some() {
            metric.unit().to_string()
        } else {
            suite.unit().to_string()
        };
        let pattern = args
            .pattern
            .clone()
            .unwrap_or_else(|| suite.pattern().to_string());

        let config = Self {
            suite,
            workload,
            label,
            bin_dir: args.bin_dir.clone(),
            program_args,
            threads: args.threads.clone(),
            trials: args.trials,
            skip_serial: args.skip_serial,
            variants,
            metric,
            pattern,
            unit,
            numa: args.numa,
            stack_size_kb: args.stack_size,
            wait_policy: suite.wait_policy().map(str::to_string),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate cross-field constraints. Called by [`Self::from_args`] and
    /// again by [`plan`] so that hand-built configurations (tests, library
    /// callers) go through the same checks.
    pub fn validate(&self) -> Result<()> {
        if self.trials < 1 {
            return Err(HarnessError::config("trial count must be at least 1"));
        }
        if !self.variants.is_empty() && self.threads.is_empty() {
            return Err(HarnessError::config(
                "thread count list must not be empty when parallel variants are requested",
            ));
        }
        if self.threads.iter().any(|&n| n == 0) {
            return Err(HarnessError::config("thread counts must be positive"));
        }
        let regex = regex::Regex::new(&self.pattern).map_err(|e| {
            HarnessError::Configuration(format!("invalid output-scan pattern: {}", e))
        })?;
        // captures_len counts the implicit whole-match group.
        if regex.captures_len() != 2 {
            return Err(HarnessError::config(
                "output-scan pattern must contain exactly one capturing group",
            ));
        }
        Ok(())
    }

    /// Path of the executable for a variant suffix.
    fn executable(&self, suffix: &str) -> PathBuf {
        self.bin_dir
            .join(format!("{}.{}.{}", self.suite.program(), self.label, suffix))
    }
}

/// Build the program argument vector for a suite and workload.
fn resolve_program_args(
    suite: Suite,
    workload: &str,
    input_dir: &std::path::Path,
) -> Result<Vec<String>> {
    match suite {
        Suite::Uts => {
            let input = input_dir
                .join("uts")
                .join(format!("{}.input", workload));
            Ok(vec!["-f".to_string(), input.display().to_string()])
        }
        Suite::Fft => {
            let n: u64 = workload.parse().map_err(|_| {
                HarnessError::Configuration(format!(
                    "fft workload must be a positive integer element count, got `{}`",
                    workload
                ))
            })?;
            Ok(vec!["-n".to_string(), n.to_string()])
        }
        Suite::Sparselu => {
            let n: u64 = workload.parse().map_err(|_| {
                HarnessError::Configuration(format!(
                    "sparselu workload must be a positive integer matrix size, got `{}`",
                    workload
                ))
            })?;
            Ok(vec![
                "-n".to_string(),
                n.to_string(),
                "-m".to_string(),
                n.to_string(),
            ])
        }
    }
}

/// One concrete, fully resolved invocation. Immutable once constructed;
/// created by [`plan`] and consumed exactly once by the trial executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSpec {
    /// Variant label: `serial` or a task-variant name.
    pub variant: String,

    /// Thread count for parallel variants, absent for the serial baseline.
    pub threads: Option<usize>,

    /// Path of the executable to spawn.
    pub program: PathBuf,

    /// Arguments passed to the executable.
    pub args: Vec<String>,

    /// Per-run environment variables (e.g. `OMP_NUM_THREADS`), applied on
    /// top of the sweep-wide execution context.
    pub env: Vec<(String, String)>,
}

impl fmt::Display for RunSpec {
    /// Renders the equivalent shell command line, environment assignments
    /// first, for progress lines and diagnostics.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.env {
            write!(f, "{}={} ", key, value)?;
        }
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Expand a configuration into the ordered sequence of runs.
///
/// Order: serial baseline (unless skipped), then for each variant in
/// configured order, one run per thread count in configured order. The
/// sequence length is `(skip_serial ? 0 : 1) + variants × threads`.
pub fn plan(config: &BenchmarkConfig) -> Result<Vec<RunSpec>> {
    config.validate()?;

    let mut specs = Vec::new();

    if !config.skip_serial {
        specs.push(RunSpec {
            variant: "serial".to_string(),
            threads: None,
            program: config.executable("serial"),
            args: config.program_args.clone(),
            env: Vec::new(),
        });
    }

    for variant in &config.variants {
        for &threads in &config.threads {
            specs.push(RunSpec {
                variant: variant.label.clone(),
                threads: Some(threads),
                program: config.executable(&variant.suffix),
                args: config.program_args.clone(),
                env: vec![("OMP_NUM_THREADS".to_string(), threads.to_string())],
            });
        }
    }

    Ok(specs)
}
