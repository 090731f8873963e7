//! Execution wrapper: one tool, one artifact section, one status.

use chrono::Local;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use stegtriage_runner::{CommandSpec, ProcessOutput};
use stegtriage_utils::error::{InvocationError, StegError, WorkspaceError};
use stegtriage_utils::logging;
use stegtriage_utils::types::{ExitOnePolicy, ToolStatus};

use crate::artifact::{SectionFooter, SectionHeader};
use crate::progress::ToolSpinner;
use crate::run::{AnalysisRun, Engine};
use crate::workspace::OutputCategory;

/// One planned external tool execution.
#[derive(Debug, Clone)]
pub struct ToolInvocation {
    /// Artifact stem; also the key for `[tools.<name>]` overrides
    pub name: String,
    /// Executable whose presence gates the step
    pub probe: String,
    pub command: CommandSpec,
    pub category: OutputCategory,
    /// Explicit budget; otherwise taken from configuration
    pub budget: Option<Duration>,
    /// Explicit exit-code-1 policy; otherwise taken from configuration
    pub exit_one: Option<ExitOnePolicy>,
    /// Directories the tool writes into
    pub create_dirs: Vec<PathBuf>,
}

impl ToolInvocation {
    #[must_use]
    pub fn new(name: impl Into<String>, category: OutputCategory, command: CommandSpec) -> Self {
        Self {
            name: name.into(),
            probe: command.program_name(),
            command,
            category,
            budget: None,
            exit_one: None,
            create_dirs: Vec::new(),
        }
    }

    #[must_use]
    pub fn probe(mut self, tool: impl Into<String>) -> Self {
        self.probe = tool.into();
        self
    }

    #[must_use]
    pub fn budget(mut self, budget: Duration) -> Self {
        self.budget = Some(budget);
        self
    }

    #[must_use]
    pub fn exit_one(mut self, policy: ExitOnePolicy) -> Self {
        self.exit_one = Some(policy);
        self
    }

    #[must_use]
    pub fn create_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.create_dirs.push(dir.into());
        self
    }

    pub fn validate(&self) -> Result<(), InvocationError> {
        if self.name.trim().is_empty() {
            return Err(InvocationError::EmptyName);
        }
        if self.command.program.is_empty() {
            return Err(InvocationError::EmptyCommand {
                name: self.name.clone(),
            });
        }
        Ok(())
    }
}

/// Result of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolReport {
    pub name: String,
    pub status: ToolStatus,
    pub exit_code: Option<i32>,
    pub duration: Duration,
    /// `None` when the tool was skipped
    pub artifact: Option<PathBuf>,
}

/// Map a process outcome to a tool status.
#[must_use]
pub fn classify(output: &ProcessOutput, exit_one: ExitOnePolicy) -> ToolStatus {
    if output.interrupted {
        return ToolStatus::Interrupted;
    }
    if output.timed_out {
        return ToolStatus::Timeout;
    }
    match output.exit_code {
        Some(0) => ToolStatus::Success,
        Some(1) => exit_one.status(),
        _ => ToolStatus::Error,
    }
}

fn ensure_dir(path: &Path) -> Result<(), WorkspaceError> {
    fs::create_dir_all(path).map_err(|e| WorkspaceError::CreateDir {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn write_failed(path: &Path, e: &std::io::Error) -> WorkspaceError {
    WorkspaceError::WriteFile {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}

impl Engine {
    fn budget_for(&self, invocation: &ToolInvocation) -> Duration {
        invocation.budget.unwrap_or_else(|| {
            self.config()
                .step_timeout(&invocation.name, &invocation.probe)
        })
    }

    fn exit_one_for(&self, invocation: &ToolInvocation) -> ExitOnePolicy {
        invocation.exit_one.unwrap_or_else(|| {
            self.config()
                .step_exit_one_policy(&invocation.name, &invocation.probe)
        })
    }

    fn announce(&self, name: &str, status: ToolStatus, duration: Option<Duration>) {
        if self.console() {
            logging::print_tool_status(name, status, duration);
        }
    }

    /// Run one tool against the run's workspace.
    ///
    /// Tool failures are statuses, not errors: `Err` is returned only for a
    /// malformed invocation (no side effects) or when the artifact cannot be
    /// created or written.
    pub fn run_tool(
        &self,
        run: &mut AnalysisRun,
        invocation: &ToolInvocation,
    ) -> Result<ToolReport, StegError> {
        invocation.validate()?;

        let workspace = run.workspace();
        let artifact = workspace.artifact_path(invocation.category, &invocation.name);
        if let Some(parent) = artifact.parent() {
            ensure_dir(parent)?;
        }

        if !self.probe().is_available(&invocation.probe) {
            workspace.log().warn(format!(
                "Skipping {}: {} is not installed",
                invocation.name, invocation.probe
            ));
            if let Err(e) = workspace.record_skip(
                &invocation.name,
                &format!("{} not found on PATH", invocation.probe),
            ) {
                workspace.log().error(e.to_string());
            }
            run.counters_mut().record(ToolStatus::SkippedUnavailable);
            self.announce(&invocation.name, ToolStatus::SkippedUnavailable, None);
            return Ok(ToolReport {
                name: invocation.name.clone(),
                status: ToolStatus::SkippedUnavailable,
                exit_code: None,
                duration: Duration::ZERO,
                artifact: None,
            });
        }

        for dir in &invocation.create_dirs {
            ensure_dir(dir)?;
        }

        let budget = self.budget_for(invocation);
        let exit_one = self.exit_one_for(invocation);
        let command_line = invocation.command.display();

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&artifact)
            .map_err(|e| write_failed(&artifact, &e))?;

        SectionHeader {
            tool: &invocation.name,
            command: &command_line,
            category: invocation.category.rel_path(),
            started_at: Local::now(),
            budget,
        }
        .write_to(&mut file)
        .map_err(|e| write_failed(&artifact, &e))?;

        let sink = file.try_clone().map_err(|e| write_failed(&artifact, &e))?;

        workspace.log().info(format!("Running {}: {command_line}", invocation.name));

        let spinner = ToolSpinner::start(self.progress(), &invocation.name, &command_line);
        let started = Instant::now();
        let outcome = self.runner().run(&invocation.command, sink, budget);
        spinner.finish();

        let (status, exit_code, duration) = match outcome {
            Ok(output) => (classify(&output, exit_one), output.exit_code, output.duration),
            Err(e) => {
                let _ = writeln!(file, "stegtriage: {e}");
                workspace.log().error(format!("{} could not be run: {e}", invocation.name));
                (ToolStatus::Error, None, started.elapsed())
            }
        };

        SectionFooter {
            duration,
            exit_code,
            status,
        }
        .write_to(&mut file)
        .map_err(|e| write_failed(&artifact, &e))?;

        let summary = format!(
            "{} finished: {status} (exit code {}, {:.2}s)",
            invocation.name,
            exit_code.map_or_else(|| "none".to_string(), |c| c.to_string()),
            duration.as_secs_f64()
        );
        match status {
            ToolStatus::Success => workspace.log().info(summary),
            ToolStatus::Warning | ToolStatus::Interrupted => workspace.log().warn(summary),
            ToolStatus::Timeout => workspace.log().warn(format!(
                "{summary}; killed after the {}s budget, partial output kept",
                budget.as_secs()
            )),
            ToolStatus::Error | ToolStatus::SkippedUnavailable => workspace.log().error(summary),
        }

        run.counters_mut().record(status);
        self.announce(&invocation.name, status, Some(duration));

        Ok(ToolReport {
            name: invocation.name.clone(),
            status,
            exit_code,
            duration,
            artifact: Some(artifact),
        })
    }
}
