use crate::metrics::MetricKind;
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// OMP Benchmark Suite - A sweep driver for OpenMP task-parallel workloads
#[derive(Parser, Debug, Clone)]
#[clap(version, about, long_about = None)]
pub struct Args {
    /// Benchmark suite to drive
    #[clap(value_enum)]
    pub suite: Suite,

    /// Workload identifier (input file stem for uts, problem size for
    /// fft/sparselu); defaults to the suite's standard workload
    #[clap(short = 'w', long)]
    pub workload: Option<String>,

    /// Thread counts to sweep, in report order (not sorted)
    #[clap(short = 't', long, num_args = 1.., default_values_t = vec![2, 4, 8, 16, 24, 48])]
    pub threads: Vec<usize>,

    /// Number of trials per configuration
    #[clap(short = 'i', long, default_value_t = crate::defaults::TRIALS)]
    pub trials: usize,

    /// Task variants to run, in report order (defaults to every variant of
    /// the suite)
    #[clap(long, num_args = 1..)]
    pub variants: Option<Vec<String>>,

    /// Skip the serial baseline
    #[clap(long, default_value_t = false)]
    pub skip_serial: bool,

    /// Interleave memory across NUMA nodes with numactl
    #[clap(long, default_value_t = false)]
    pub numa: bool,

    /// Executable label selecting the binary family
    /// (<bin-dir>/<suite>.<label>.<variant>)
    #[clap(long, default_value = crate::defaults::EXECUTABLE_LABEL)]
    pub label: String,

    /// Directory containing the benchmark executables
    #[clap(long, default_value = "bin")]
    pub bin_dir: PathBuf,

    /// Directory containing workload input files
    #[clap(long, default_value = "inputs")]
    pub input_dir: PathBuf,

    /// Override the suite's output-scan pattern (must contain exactly one
    /// capturing group yielding a floating-point literal)
    #[clap(long)]
    pub pattern: Option<String>,

    /// Override the suite's metric kind
    #[clap(long, value_enum)]
    pub metric: Option<MetricKind>,

    /// Stack size limit for benchmark processes, in KiB
    #[clap(long, default_value_t = crate::defaults::STACK_SIZE_KB)]
    pub stack_size: u64,

    /// Output file for results (JSON format)
    #[clap(short = 'o', long)]
    pub output_file: Option<PathBuf>,
}

/// Available benchmark suites
///
/// Each suite fixes the family-specific pieces of a sweep: the executable
/// name stem, the metric direction and unit, the output-scan pattern, the
/// workload argument shape, and the task-variant table mapping report
/// labels to executable-name suffixes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Suite {
    /// Unbalanced Tree Search (reports nodes/sec)
    #[clap(name = "uts")]
    Uts,

    /// Fast Fourier Transform (reports elapsed seconds)
    #[clap(name = "fft")]
    Fft,

    /// Sparse LU factorization (reports elapsed seconds)
    #[clap(name = "sparselu")]
    Sparselu,
}

impl std::fmt::Display for Suite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program())
    }
}

impl Suite {
    /// Executable name stem: binaries are named
    /// `<stem>.<label>.<variant-suffix>`.
    pub fn program(&self) -> &'static str {
        match self {
            Suite::Uts => "uts",
            Suite::Fft => "fft",
            Suite::Sparselu => "sparselu",
        }
    }

    /// Metric direction reported by this suite's executables.
    pub fn metric(&self) -> MetricKind {
        match self {
            Suite::Uts => MetricKind::Throughput,
            Suite::Fft | Suite::Sparselu => MetricKind::Time,
        }
    }

    /// Unit label printed in the report header.
    pub fn unit(&self) -> &'static str {
        match self {
            Suite::Uts => "nodes/sec",
            Suite::Fft | Suite::Sparselu => "sec",
        }
    }

    /// Output-scan pattern with one capturing group for the metric value.
    pub fn pattern(&self) -> &'static str {
        match self {
            Suite::Uts => r"Nodes/Sec\s*= ([0-9.]+)",
            Suite::Fft | Suite::Sparselu => r"Time Program\s*= ([0-9.]+)",
        }
    }

    /// `OMP_WAIT_POLICY` exported for every run of this suite, if any.
    pub fn wait_policy(&self) -> Option<&'static str> {
        match self {
            Suite::Uts | Suite::Fft => Some("ACTIVE"),
            Suite::Sparselu => None,
        }
    }

    /// Workload used when none is given on the command line.
    pub fn default_workload(&self) -> &'static str {
        match self {
            Suite::Uts => "small",
            Suite::Fft => "268435456",
            Suite::Sparselu => "100",
        }
    }

    /// Task-variant table: (report label, executable-name suffix) in
    /// report order.
    pub fn variants(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Suite::Uts | Suite::Fft => {
                &[("untied", "omp-tasks"), ("tied", "omp-tasks-tied")]
            }
            Suite::Sparselu => &[
                ("for-untied", "for-omp-tasks"),
                ("for-tied", "for-omp-tasks-tied"),
                ("single-untied", "single-omp-tasks"),
                ("single-tied", "single-omp-tasks-tied"),
            ],
        }
    }

    /// Look up the executable-name suffix for a variant label.
    pub fn variant_suffix(&self, label: &str) -> Option<&'static str> {
        self.variants()
            .iter()
            .find(|(name, _)| *name == label)
            .map(|(_, suffix)| *suffix)
    }
}
