//! # OMP Benchmark Sweep Driver
//!
//! A driver for benchmarking OpenMP task-parallel workloads across thread
//! counts. Given a directory of pre-built benchmark executables (serial and
//! task-variant builds of the same workload), the driver expands a
//! configuration matrix into an ordered list of invocations, runs each one
//! for a configured number of trials under a controlled environment
//! (`OMP_NUM_THREADS`, `OMP_STACKSIZE`, stack rlimit, optional NUMA
//! interleave), scans each child's standard output for a metric pattern,
//! and reports the best extracted value per configuration.
//!
//! ## Architecture Overview
//!
//! Two components composed linearly:
//!
//! - `planner`: expands a validated [`BenchmarkConfig`] into an ordered
//!   sequence of [`RunSpec`] values — pure, deterministic, no side effects
//! - `executor`: runs each [`RunSpec`] for N sequential trials, captures
//!   output, extracts samples, and reduces them to one value
//!
//! Around the core: `cli` (argument parsing and suite presets), `metrics`
//! (extraction and reduction), `results` (report rendering and JSON
//! export), `logging`, and `utils`.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use omp_benchmark::{cli::Args, executor::TrialExecutor, planner, results::SweepResults};
//! use clap::Parser;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = Args::parse_from(["omp-benchmark", "uts", "-t", "2", "4", "-i", "3"]);
//!     let config = planner::BenchmarkConfig::from_args(&args)?;
//!     let executor = TrialExecutor::new(&config)?;
//!
//!     let mut results = SweepResults::new(&config);
//!     for spec in planner::plan(&config)? {
//!         results.push(executor.execute(&spec).await?);
//!     }
//!     print!("{}", results);
//!     Ok(())
//! }
//! ```
//!
//! ## Execution Model
//!
//! The driver itself is sequential: one child process at a time, each
//! waited on before the next starts. The parallelism being measured lives
//! inside the children and is controlled entirely through their
//! environment. Overlapping trials would contend for cores and memory
//! bandwidth and corrupt the measurement.

/// Command-line interface and suite presets
///
/// Argument parsing with clap and the `Suite` enumeration fixing the
/// family-specific pieces of a sweep: executable stems, scan patterns,
/// metric directions, variant tables, and workload argument shapes.
pub mod cli;

/// Error taxonomy
///
/// Fatal conditions (configuration, spawn failure, interruption) as a
/// typed enum; pattern-match absence is deliberately not here.
pub mod error;

/// Trial execution engine
///
/// Spawns one child per trial with a per-process environment map, captures
/// standard output, applies the stack rlimit, and handles Ctrl-C by
/// terminating the in-flight child.
pub mod executor;

/// Sample extraction and reduction
///
/// The output-scan regex machinery and the metric-direction reduction
/// (minimum for time, maximum for throughput) over the pooled samples of
/// all trials.
pub mod metrics;

/// Run planning
///
/// Deterministic expansion of the configuration matrix into ordered
/// [`RunSpec`] values.
pub mod planner;

/// Result collection and output
///
/// Ordered aggregation, the textual report (unit header, thread line,
/// per-variant sections), and the JSON results document.
pub mod results;

pub mod logging;
pub mod utils;

// Re-export the types most library callers need.

/// Resolved sweep configuration and the planner entry point.
pub use planner::{plan, BenchmarkConfig, RunSpec, TaskVariant};

/// The trial execution engine and its invocation environment.
pub use executor::{ExecutionContext, TrialExecutor};

/// Metric direction and the per-configuration aggregate.
pub use metrics::{AggregateResult, MetricKind};

/// Ordered results with report rendering and JSON export.
pub use results::SweepResults;

/// CLI types, re-exported for programmatic construction of sweeps.
pub use cli::{Args, Suite};

/// Fatal error taxonomy.
pub use error::HarnessError;

/// The current version of the benchmark driver, recorded in JSON output
/// for reproducibility.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default configuration values
///
/// Chosen to match the conventions of the benchmark binaries this driver
/// targets; every one of them can be overridden on the command line.
pub mod defaults {
    /// Default number of trials per configuration.
    ///
    /// A single trial keeps full sweeps fast; raise it (e.g. to 5) when
    /// the best-of-N reduction should smooth scheduler noise.
    pub const TRIALS: usize = 1;

    /// Default stack size limit for benchmark processes, in KiB (16 MiB).
    ///
    /// Task-recursive benchmarks (tree search, recursive factorization)
    /// overflow the common 8 MiB default soft limit. The same value is
    /// exported as `OMP_STACKSIZE` so worker threads get matching stacks.
    pub const STACK_SIZE_KB: u64 = 16 * 1024;

    /// Default executable label: binaries are named
    /// `<suite>.<label>.<variant>` and the reference binaries are built
    /// with icc.
    pub const EXECUTABLE_LABEL: &str = "icc";

    /// NUMA binding prefix applied when `--numa` is given. Interleaving
    /// keeps memory bandwidth symmetric across nodes for thread counts
    /// that span sockets.
    pub const NUMA_COMMAND: &[&str] = &["numactl", "--interleave=all"];
}
