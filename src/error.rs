//! Error taxonomy for the sweep driver.
//!
//! Only conditions that abort a sweep live here. A run whose output never
//! matches the scan pattern is *not* an error: it surfaces as an absent
//! value on the corresponding [`AggregateResult`](crate::metrics::AggregateResult)
//! and the sweep moves on to the next configuration.

use thiserror::Error;

/// Fatal conditions raised by the planner and the trial executor.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Invalid or missing configuration value. Raised before any process
    /// is spawned.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// The benchmark executable could not be started at all (missing
    /// binary, permission denied). Aborts the remainder of the sweep;
    /// results collected so far are still reported.
    #[error("failed to start `{command}`: {source}")]
    Spawn {
        /// The rendered command line of the run that failed to start.
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The sweep was interrupted (Ctrl-C). The in-flight child process has
    /// been terminated.
    #[error("sweep interrupted")]
    Interrupted,
}

impl HarnessError {
    /// Shorthand for a [`HarnessError::Configuration`] wrapped in anyhow.
    pub fn config<S: Into<String>>(message: S) -> anyhow::Error {
        HarnessError::Configuration(message.into()).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error_message() {
        let err = HarnessError::Configuration("thread count list is empty".to_string());
        assert_eq!(
            err.to_string(),
            "invalid configuration: thread count list is empty"
        );
    }

    #[test]
    fn test_spawn_error_names_command() {
        let err = HarnessError::Spawn {
            command: "bin/uts.icc.serial -f inputs/uts/small.input".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        };
        let message = err.to_string();
        assert!(message.contains("bin/uts.icc.serial"));
    }

    #[test]
    fn test_config_helper_downcasts() {
        let err = HarnessError::config("trials must be at least 1");
        assert!(matches!(
            err.downcast_ref::<HarnessError>(),
            Some(HarnessError::Configuration(_))
        ));
    }
}
