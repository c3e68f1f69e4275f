//! # OMP Benchmark Sweep Driver - Main Entry Point
//!
//! The binary wires the pieces together:
//!
//! 1. **Initialize logging**: colorized tracing output on stderr
//! 2. **Parse arguments**: suite selection plus sweep parameters
//! 3. **Resolve configuration**: CLI arguments against suite presets
//! 4. **Plan**: expand the configuration matrix into ordered run specs
//! 5. **Execute**: run every spec sequentially, trial by trial
//! 6. **Report**: render the sweep report on stdout, optionally write JSON
//!
//! ## Error Handling
//!
//! Configuration and spawn failures abort the sweep with a non-zero exit
//! status, but results collected before the failure are still rendered:
//! a sweep that dies at variant three still reports variants one and two.
//! A configuration whose output never matched the scan pattern is not an
//! error; it is reported as `n/a` and the sweep continues.

use anyhow::Result;
use clap::Parser;
use omp_benchmark::{
    cli::Args,
    executor::TrialExecutor,
    planner::{self, BenchmarkConfig},
    results::SweepResults,
    utils::format_duration,
};
use std::time::Instant;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Log level can be controlled via RUST_LOG, e.g.
    // RUST_LOG=debug omp-benchmark uts -t 2 4
    omp_benchmark::logging::init();

    let args = Args::parse();
    let config = BenchmarkConfig::from_args(&args)?;
    info!(
        "{} sweep: workload {}, {} trial(s) per configuration",
        config.suite, config.workload, config.trials
    );

    let specs = planner::plan(&config)?;
    let executor = TrialExecutor::new(&config)?;

    let started = Instant::now();
    let mut results = SweepResults::new(&config);
    let mut failure = None;

    for spec in &specs {
        match executor.execute(spec).await {
            Ok(aggregate) => results.push(aggregate),
            Err(e) => {
                // Fatal: spawn failure or interruption. Keep what we have,
                // skip the rest.
                error!("aborting sweep at `{}`: {:#}", spec, e);
                failure = Some(e);
                break;
            }
        }
    }

    info!(
        "sweep finished: {}/{} configurations in {}",
        results.len(),
        specs.len(),
        format_duration(started.elapsed())
    );

    print!("{}", results);

    if let Some(path) = &args.output_file {
        results.write_json(path)?;
    }

    match failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
