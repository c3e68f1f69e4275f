//! Trial execution: running one planned invocation for the configured
//! number of trials and reducing whatever the child processes printed.
//!
//! The executor is deliberately sequential. The parallelism under test
//! lives inside the spawned benchmark processes and is controlled through
//! their environment; overlapping trials would contend for the same cores
//! and memory and corrupt the measurement, so each child runs to completion
//! before the next one starts.

use crate::{
    error::HarnessError,
    metrics::{extract_samples, AggregateResult, MetricKind},
    planner::{BenchmarkConfig, RunSpec},
};
use anyhow::{Context, Result};
use regex::Regex;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Sweep-wide invocation environment, applied identically to every trial
/// of every run.
///
/// This is an explicit value object rather than ambient process state: the
/// executor never mutates its own environment, it only configures each
/// child's.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// Environment variables exported to every benchmark process
    /// (`OMP_STACKSIZE`, and `OMP_WAIT_POLICY` for suites that set one).
    pub env: Vec<(String, String)>,

    /// Soft stack limit (RLIMIT_STACK) for benchmark processes, in KiB.
    /// Task-recursive benchmarks overflow the default stack without it.
    pub stack_size_kb: Option<u64>,

    /// Command prefix binding memory placement, e.g.
    /// `numactl --interleave=all`. Empty when NUMA binding is disabled.
    pub numa_prefix: Vec<String>,
}

impl ExecutionContext {
    /// Derive the invocation environment from a resolved configuration.
    pub fn from_config(config: &BenchmarkConfig) -> Self {
        let mut env = vec![(
            "OMP_STACKSIZE".to_string(),
            // Unitless OMP_STACKSIZE values are kibibytes.
            config.stack_size_kb.to_string(),
        )];
        if let Some(policy) = &config.wait_policy {
            env.push(("OMP_WAIT_POLICY".to_string(), policy.clone()));
        }

        let numa_prefix = if config.numa {
            crate::defaults::NUMA_COMMAND
                .iter()
                .map(|s| (*s).to_string())
                .collect()
        } else {
            Vec::new()
        };

        Self {
            env,
            stack_size_kb: Some(config.stack_size_kb),
            numa_prefix,
        }
    }
}

/// Executes planned runs trial by trial and reduces their output.
pub struct TrialExecutor {
    trials: usize,
    metric: MetricKind,
    pattern: Regex,
    context: ExecutionContext,
}

impl TrialExecutor {
    /// Build an executor from a resolved configuration. Compiles the
    /// output-scan pattern once for the whole sweep.
    pub fn new(config: &BenchmarkConfig) -> Result<Self> {
        let pattern = Regex::new(&config.pattern).map_err(|e| {
            HarnessError::Configuration(format!("invalid output-scan pattern: {}", e))
        })?;
        if pattern.captures_len() != 2 {
            return Err(HarnessError::config(
                "output-scan pattern must contain exactly one capturing group",
            ));
        }
        Ok(Self {
            trials: config.trials,
            metric: config.metric,
            pattern,
            context: ExecutionContext::from_config(config),
        })
    }

    /// Executor over an explicit context, for callers that assemble the
    /// pieces themselves.
    pub fn with_context(
        trials: usize,
        metric: MetricKind,
        pattern: Regex,
        context: ExecutionContext,
    ) -> Self {
        Self {
            trials,
            metric,
            pattern,
            context,
        }
    }

    /// Run every trial of one spec and reduce the pooled samples.
    ///
    /// A trial that exits non-zero still has its output scanned; only a
    /// failure to spawn at all aborts the sweep. All `trials` invocations
    /// run regardless of individual exit status, and strictly one after
    /// another.
    pub async fn execute(&self, spec: &RunSpec) -> Result<AggregateResult> {
        match spec.threads {
            Some(threads) => info!("{} @ {} threads", spec.variant, threads),
            None => info!("{}", spec.variant),
        }
        debug!("command: {}", spec);

        let mut samples = Vec::new();
        for trial in 1..=self.trials {
            let output = self.run_trial(spec).await?;

            if !output.status.success() {
                warn!(
                    "trial {}/{} of {} exited with {}; scanning its output anyway",
                    trial, self.trials, spec.variant, output.status
                );
            }

            let stdout = String::from_utf8_lossy(&output.stdout);
            let found = extract_samples(&self.pattern, &stdout);
            debug!(
                "trial {}/{} of {}: {} sample(s)",
                trial,
                self.trials,
                spec.variant,
                found.len()
            );
            samples.extend(found);
        }

        if samples.is_empty() {
            warn!("no metric samples extracted for `{}`", spec);
        }

        Ok(AggregateResult {
            variant: spec.variant.clone(),
            threads: spec.threads,
            value: self.metric.reduce(&samples),
            sample_count: samples.len(),
        })
    }

    /// Spawn one child for the spec, wait for it, and capture its stdout.
    ///
    /// Ctrl-C terminates the in-flight child (`kill_on_drop`) and surfaces
    /// as [`HarnessError::Interrupted`].
    async fn run_trial(&self, spec: &RunSpec) -> Result<std::process::Output> {
        let mut command = self.build_command(spec);
        let child = command.spawn().map_err(|source| HarnessError::Spawn {
            command: spec.to_string(),
            source,
        })?;

        tokio::select! {
            output = child.wait_with_output() => {
                output.with_context(|| format!("failed to collect output of `{}`", spec))
            }
            _ = tokio::signal::ctrl_c() => {
                Err(HarnessError::Interrupted.into())
            }
        }
    }

    /// Assemble the child command: NUMA prefix, program, arguments, the
    /// sweep-wide environment, the per-run environment, and the stack
    /// limit hook.
    fn build_command(&self, spec: &RunSpec) -> Command {
        let mut command = match self.context.numa_prefix.split_first() {
            Some((prefix, prefix_args)) => {
                let mut command = Command::new(prefix);
                command.args(prefix_args);
                command.arg(&spec.program);
                command
            }
            None => Command::new(&spec.program),
        };
        command.args(&spec.args);

        for (key, value) in &self.context.env {
            command.env(key, value);
        }
        for (key, value) in &spec.env {
            command.env(key, value);
        }

        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        #[cfg(unix)]
        if let Some(stack_kb) = self.context.stack_size_kb {
            let stack_bytes = stack_kb.saturating_mul(1024);
            // The hook runs in the forked child before exec. Only the soft
            // limit is raised; the hard limit stays untouched so
            // unprivileged runs cannot fail here.
            unsafe {
                command.pre_exec(move || {
                    use nix::sys::resource::{getrlimit, setrlimit, Resource};
                    let (_, hard) = getrlimit(Resource::RLIMIT_STACK)
                        .map_err(|e| std::io::Error::from_raw_os_error(e as i32))?;
                    setrlimit(Resource::RLIMIT_STACK, stack_bytes.min(hard), hard)
                        .map_err(|e| std::io::Error::from_raw_os_error(e as i32))?;
                    Ok(())
                });
            }
        }

        command
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Args;
    use clap::Parser;

    fn config(argv: &[&str]) -> BenchmarkConfig {
        BenchmarkConfig::from_args(&Args::parse_from(argv)).unwrap()
    }

    #[test]
    fn test_context_exports_stack_and_wait_policy() {
        let ctx = ExecutionContext::from_config(&config(&["omp-benchmark", "uts"]));
        assert!(ctx
            .env
            .contains(&("OMP_STACKSIZE".to_string(), "16384".to_string())));
        assert!(ctx
            .env
            .contains(&("OMP_WAIT_POLICY".to_string(), "ACTIVE".to_string())));
        assert_eq!(ctx.stack_size_kb, Some(16384));
        assert!(ctx.numa_prefix.is_empty());
    }

    #[test]
    fn test_sparselu_context_has_no_wait_policy() {
        let ctx = ExecutionContext::from_config(&config(&["omp-benchmark", "sparselu"]));
        assert!(!ctx.env.iter().any(|(key, _)| key == "OMP_WAIT_POLICY"));
    }

    #[test]
    fn test_numa_flag_adds_prefix() {
        let ctx = ExecutionContext::from_config(&config(&["omp-benchmark", "uts", "--numa"]));
        assert_eq!(ctx.numa_prefix, vec!["numactl", "--interleave=all"]);
    }

    #[test]
    fn test_stack_size_override() {
        let ctx = ExecutionContext::from_config(&config(&[
            "omp-benchmark",
            "fft",
            "--stack-size",
            "32768",
        ]));
        assert!(ctx
            .env
            .contains(&("OMP_STACKSIZE".to_string(), "32768".to_string())));
    }

    #[test]
    fn test_executor_rejects_patternless_capture() {
        let mut cfg = config(&["omp-benchmark", "uts"]);
        cfg.pattern = "no capture group here".to_string();
        assert!(TrialExecutor::new(&cfg).is_err());
    }

    #[test]
    fn test_build_command_env_layering() {
        let cfg = config(&["omp-benchmark", "uts", "-t", "8"]);
        let executor = TrialExecutor::new(&cfg).unwrap();
        let specs = crate::planner::plan(&cfg).unwrap();
        let untied = specs.iter().find(|s| s.variant == "untied").unwrap();

        let command = executor.build_command(untied);
        let envs: Vec<(String, String)> = command
            .as_std()
            .get_envs()
            .filter_map(|(key, value)| {
                Some((
                    key.to_string_lossy().into_owned(),
                    value?.to_string_lossy().into_owned(),
                ))
            })
            .collect();
        assert!(envs.contains(&("OMP_NUM_THREADS".to_string(), "8".to_string())));
        assert!(envs.contains(&("OMP_STACKSIZE".to_string(), "16384".to_string())));
    }
}
