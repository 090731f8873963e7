use crate::error::RunnerError;
use std::fs::File;
use std::time::Duration;

use super::CommandSpec;

// ============================================================================
// ProcessRunner Trait - budgeted process execution interface
// ============================================================================

/// Outcome of one budgeted process execution.
///
/// Output is not captured here: it is streamed straight into the sink handed
/// to [`ProcessRunner::run`], so anything written before a kill survives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code from the process (None if terminated by signal)
    pub exit_code: Option<i32>,
    /// Whether the process was killed at the time budget
    pub timed_out: bool,
    /// Whether the process was killed because the operator interrupted it
    pub interrupted: bool,
    /// Wall-clock time from spawn to reap
    pub duration: Duration,
}

impl ProcessOutput {
    /// A process that ran to completion with the given exit code.
    #[must_use]
    pub fn exited(exit_code: Option<i32>, duration: Duration) -> Self {
        Self {
            exit_code,
            timed_out: false,
            interrupted: false,
            duration,
        }
    }

    /// A process killed at its time budget.
    #[must_use]
    pub fn timed_out(exit_code: Option<i32>, duration: Duration) -> Self {
        Self {
            exit_code,
            timed_out: true,
            interrupted: false,
            duration,
        }
    }

    /// A process killed because of an operator interrupt.
    #[must_use]
    pub fn interrupted(exit_code: Option<i32>, duration: Duration) -> Self {
        Self {
            exit_code,
            timed_out: false,
            interrupted: true,
            duration,
        }
    }

    /// Check if the process exited successfully (exit code 0).
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == Some(0) && !self.timed_out && !self.interrupted
    }
}

/// Trait for budgeted process execution.
///
/// Implementations MUST use argv-style APIs only (no shell string evaluation)
/// and MUST send both stdout and stderr of the child to `sink`.
///
/// # Threading
///
/// `ProcessRunner` is a synchronous interface. Implementations MAY internally
/// drive an async runtime (e.g., Tokio for timeouts) but MUST NOT expose async
/// in the public API.
pub trait ProcessRunner {
    /// Execute a command, killing it once `budget` has elapsed.
    ///
    /// # Returns
    ///
    /// * `Ok(ProcessOutput)` - The process ended (exit, timeout or interrupt)
    /// * `Err(RunnerError::*)` - The process could not be started or reaped
    fn run(
        &self,
        cmd: &CommandSpec,
        sink: File,
        budget: Duration,
    ) -> Result<ProcessOutput, RunnerError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_process_output_success() {
        let ok = ProcessOutput::exited(Some(0), Duration::from_millis(5));
        assert!(ok.success());

        let failure = ProcessOutput::exited(Some(1), Duration::ZERO);
        assert!(!failure.success());

        let timeout = ProcessOutput::timed_out(Some(0), Duration::ZERO);
        assert!(!timeout.success());
        assert!(timeout.timed_out);

        let interrupted = ProcessOutput::interrupted(None, Duration::ZERO);
        assert!(!interrupted.success());
        assert!(interrupted.interrupted);

        let killed = ProcessOutput::exited(None, Duration::ZERO);
        assert!(!killed.success());
    }

    /// A runner that writes canned output into the sink.
    struct EchoRunner;

    impl ProcessRunner for EchoRunner {
        fn run(
            &self,
            cmd: &CommandSpec,
            mut sink: File,
            _budget: Duration,
        ) -> Result<ProcessOutput, RunnerError> {
            writeln!(sink, "ran {}", cmd.program_name()).map_err(|e| {
                RunnerError::OutputSink {
                    reason: e.to_string(),
                }
            })?;
            Ok(ProcessOutput::exited(Some(0), Duration::ZERO))
        }
    }

    #[test]
    fn test_process_runner_writes_into_sink() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let sink = File::create(&path).unwrap();

        let output = EchoRunner
            .run(&CommandSpec::new("zsteg"), sink, Duration::from_secs(1))
            .unwrap();

        assert!(output.success());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "ran zsteg\n");
    }
}
