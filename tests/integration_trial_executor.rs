//! Integration tests driving the real trial executor against `sh`-backed
//! fake benchmark executables.

#![cfg(unix)]

use omp_benchmark::{
    error::HarnessError,
    executor::{ExecutionContext, TrialExecutor},
    metrics::MetricKind,
    planner::RunSpec,
};
use regex::Regex;
use std::path::PathBuf;

const TIME_PATTERN: &str = r"Time Program\s*= ([0-9.]+)";

fn bare_context() -> ExecutionContext {
    ExecutionContext {
        env: Vec::new(),
        stack_size_kb: None,
        numa_prefix: Vec::new(),
    }
}

fn executor(trials: usize, metric: MetricKind, pattern: &str) -> TrialExecutor {
    TrialExecutor::with_context(
        trials,
        metric,
        Regex::new(pattern).unwrap(),
        bare_context(),
    )
}

/// A run spec whose "benchmark" is an inline shell script.
fn shell_spec(script: &str) -> RunSpec {
    RunSpec {
        variant: "untied".to_string(),
        threads: Some(2),
        program: PathBuf::from("sh"),
        args: vec!["-c".to_string(), script.to_string()],
        env: Vec::new(),
    }
}

#[tokio::test]
async fn executes_exactly_trials_times_despite_failing_exit() {
    let dir = tempfile::tempdir().unwrap();
    let counter = dir.path().join("invocations");
    // Every invocation appends a line, reports a metric, then fails.
    let script = format!(
        "echo run >> {}; echo 'Time Program = 1.5'; exit 1",
        counter.display()
    );

    let executor = executor(3, MetricKind::Time, TIME_PATTERN);
    let aggregate = executor.execute(&shell_spec(&script)).await.unwrap();

    let invocations = std::fs::read_to_string(&counter).unwrap();
    assert_eq!(invocations.lines().count(), 3);
    assert_eq!(aggregate.value, Some(1.5));
    assert_eq!(aggregate.sample_count, 3);
}

#[tokio::test]
async fn pools_samples_across_trials_before_reducing() {
    let dir = tempfile::tempdir().unwrap();
    let counter = dir.path().join("invocations");
    // The reported value grows with the invocation count: 1.0, 2.0, 3.0.
    let script = format!(
        "echo run >> {c}; n=$(wc -l < {c} | tr -d ' '); echo \"Time Program = $n.0\"",
        c = counter.display()
    );

    let aggregate = executor(3, MetricKind::Time, TIME_PATTERN)
        .execute(&shell_spec(&script))
        .await
        .unwrap();
    assert_eq!(aggregate.value, Some(1.0));
    assert_eq!(aggregate.sample_count, 3);
}

#[tokio::test]
async fn throughput_takes_the_best_trial() {
    let dir = tempfile::tempdir().unwrap();
    let counter = dir.path().join("invocations");
    let script = format!(
        "echo run >> {c}; n=$(wc -l < {c} | tr -d ' '); echo \"Nodes/Sec = ${{n}}00.0\"",
        c = counter.display()
    );

    let aggregate = executor(3, MetricKind::Throughput, r"Nodes/Sec\s*= ([0-9.]+)")
        .execute(&shell_spec(&script))
        .await
        .unwrap();
    assert_eq!(aggregate.value, Some(300.0));
}

#[tokio::test]
async fn multiple_matches_in_one_trial_are_all_candidates() {
    let script =
        "printf 'Time Program = 3.2\\nTime Program = 1.5\\nTime Program = 4.0\\n'";
    let aggregate = executor(1, MetricKind::Time, TIME_PATTERN)
        .execute(&shell_spec(script))
        .await
        .unwrap();
    assert_eq!(aggregate.value, Some(1.5));
    assert_eq!(aggregate.sample_count, 3);
}

#[tokio::test]
async fn absence_is_reported_as_none_not_zero() {
    let aggregate = executor(2, MetricKind::Time, TIME_PATTERN)
        .execute(&shell_spec("echo 'no metrics in this output'"))
        .await
        .unwrap();
    assert_eq!(aggregate.value, None);
    assert_eq!(aggregate.sample_count, 0);
}

#[tokio::test]
async fn missing_executable_is_a_fatal_spawn_error() {
    let spec = RunSpec {
        variant: "serial".to_string(),
        threads: None,
        program: PathBuf::from("/nonexistent/omp-benchmark-test-binary"),
        args: vec!["-n".to_string(), "100".to_string()],
        env: Vec::new(),
    };

    let err = executor(1, MetricKind::Time, TIME_PATTERN)
        .execute(&spec)
        .await
        .unwrap_err();
    match err.downcast_ref::<HarnessError>() {
        Some(HarnessError::Spawn { command, .. }) => {
            assert!(command.contains("/nonexistent/omp-benchmark-test-binary"));
        }
        other => panic!("expected spawn error, got {:?}", other),
    }
}

#[tokio::test]
async fn per_run_and_context_env_reach_the_child() {
    let context = ExecutionContext {
        env: vec![("OMP_STACKSIZE".to_string(), "16384".to_string())],
        stack_size_kb: None,
        numa_prefix: Vec::new(),
    };
    let executor = TrialExecutor::with_context(
        1,
        MetricKind::Throughput,
        Regex::new(r"Nodes/Sec\s*= ([0-9.]+)").unwrap(),
        context,
    );

    let mut spec = shell_spec("echo \"Nodes/Sec = $OMP_NUM_THREADS$OMP_STACKSIZE\"");
    spec.env = vec![("OMP_NUM_THREADS".to_string(), "7".to_string())];

    let aggregate = executor.execute(&spec).await.unwrap();
    // 7 concatenated with 16384
    assert_eq!(aggregate.value, Some(716384.0));
    assert_eq!(aggregate.variant, "untied");
    assert_eq!(aggregate.threads, Some(2));
}

#[tokio::test]
async fn stack_limit_is_applied_to_the_child() {
    let context = ExecutionContext {
        env: Vec::new(),
        stack_size_kb: Some(16 * 1024),
        numa_prefix: Vec::new(),
    };
    let executor = TrialExecutor::with_context(
        1,
        MetricKind::Time,
        Regex::new(TIME_PATTERN).unwrap(),
        context,
    );

    // `ulimit -s` reports the soft limit in KiB.
    let spec = shell_spec("echo \"Time Program = $(ulimit -s | tr -d ' ')\"");
    let aggregate = executor.execute(&spec).await.unwrap();
    assert_eq!(aggregate.value, Some(16384.0));
}
