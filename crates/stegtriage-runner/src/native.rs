use std::fs::File;
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::process::Child;

use crate::error::RunnerError;
use crate::interrupt::InterruptFlag;
use crate::platform;
use crate::process::{ProcessOutput, ProcessRunner};
use crate::CommandSpec;

/// Default grace period between SIGTERM and SIGKILL.
pub const DEFAULT_KILL_GRACE: Duration = Duration::from_secs(2);

/// How often a running child is checked for a pending operator interrupt.
const INTERRUPT_POLL: Duration = Duration::from_millis(50);

/// Runs tools directly on the host.
///
/// Each child gets its own process group so a timeout or interrupt takes down
/// everything the tool spawned (ffmpeg helpers, binwalk extractors, ...).
#[derive(Debug, Clone)]
pub struct NativeRunner {
    kill_grace: Duration,
    interrupts: Option<Arc<InterruptFlag>>,
}

impl NativeRunner {
    #[must_use]
    pub fn new(kill_grace: Duration) -> Self {
        Self {
            kill_grace,
            interrupts: None,
        }
    }

    /// Attach the process-wide interrupt flag.
    #[must_use]
    pub fn with_interrupts(mut self, flag: Arc<InterruptFlag>) -> Self {
        self.interrupts = Some(flag);
        self
    }

    async fn execute(
        &self,
        cmd: &CommandSpec,
        sink: File,
        budget: Duration,
    ) -> Result<ProcessOutput, RunnerError> {
        let program = cmd.program_name();
        let stderr_sink = sink.try_clone().map_err(|e| RunnerError::OutputSink {
            reason: e.to_string(),
        })?;

        let mut command = cmd.to_tokio_command();
        command
            .stdin(Stdio::null())
            .stdout(Stdio::from(sink))
            .stderr(Stdio::from(stderr_sink))
            .kill_on_drop(true);

        #[cfg(unix)]
        command.process_group(0);

        let start = Instant::now();
        let mut child = command.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                RunnerError::ProgramNotFound {
                    program: program.clone(),
                }
            } else {
                RunnerError::SpawnFailed {
                    program: program.clone(),
                    reason: e.to_string(),
                }
            }
        })?;

        let _busy = self.interrupts.as_ref().map(InterruptFlag::enter_busy);

        tokio::select! {
            status = child.wait() => {
                let status = status.map_err(|e| RunnerError::WaitFailed {
                    program: program.clone(),
                    reason: e.to_string(),
                })?;
                Ok(ProcessOutput::exited(status.code(), start.elapsed()))
            }
            () = tokio::time::sleep(budget) => {
                tracing::debug!(program = %program, budget_secs = budget.as_secs(), "Time budget exceeded; terminating");
                let code = self.terminate(&mut child, &program).await?;
                Ok(ProcessOutput::timed_out(code, start.elapsed()))
            }
            () = self.wait_for_interrupt() => {
                tracing::debug!(program = %program, "Operator interrupt; terminating");
                let code = self.terminate(&mut child, &program).await?;
                Ok(ProcessOutput::interrupted(code, start.elapsed()))
            }
        }
    }

    async fn wait_for_interrupt(&self) {
        match &self.interrupts {
            Some(flag) => loop {
                if flag.take() {
                    return;
                }
                tokio::time::sleep(INTERRUPT_POLL).await;
            },
            None => std::future::pending().await,
        }
    }

    async fn terminate(&self, child: &mut Child, program: &str) -> Result<Option<i32>, RunnerError> {
        platform::terminate(child, self.kill_grace).await;
        let status = child.wait().await.map_err(|e| RunnerError::WaitFailed {
            program: program.to_string(),
            reason: e.to_string(),
        })?;
        Ok(status.code())
    }
}

impl Default for NativeRunner {
    fn default() -> Self {
        Self::new(DEFAULT_KILL_GRACE)
    }
}

impl ProcessRunner for NativeRunner {
    fn run(
        &self,
        cmd: &CommandSpec,
        sink: File,
        budget: Duration,
    ) -> Result<ProcessOutput, RunnerError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| RunnerError::ConfigurationInvalid {
                reason: format!("Failed to create runtime: {e}"),
            })?;
        runtime.block_on(self.execute(cmd, sink, budget))
    }
}
