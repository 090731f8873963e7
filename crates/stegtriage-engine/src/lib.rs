//! Orchestration engine for stegtriage
//!
//! Plans and runs the analysis phases for one input file at a time, writing
//! every tool transcript into a per-run output workspace.

// Re-export shared crates to keep `crate::` paths short in engine modules.
pub use stegtriage_config as config;
pub use stegtriage_runner as runner;

pub use stegtriage_utils::error;
pub use stegtriage_utils::exit_codes;
pub use stegtriage_utils::logging;
pub use stegtriage_utils::paths;
pub use stegtriage_utils::types;

pub mod artifact;
pub mod batch;
pub mod execution;
pub mod filetype;
pub mod interactive;
pub mod password;
pub mod phases;
pub mod progress;
pub mod prompt;
pub mod registry;
pub mod run;
pub mod summary;
pub mod validation;
pub mod workspace;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_support;

pub use batch::{BatchFailure, BatchReport};
pub use execution::{ToolInvocation, ToolReport};
pub use interactive::{ControllerEvent, ControllerState, MenuAction};
pub use password::{PasswordOutcome, PasswordTool};
pub use phases::{InterruptDecision, InterruptPolicy, PhaseOutcome, QuitOnInterrupt};
pub use prompt::Prompter;
pub use registry::{DependencyReport, PathProbe, ToolProbe};
pub use run::{AnalysisRun, Engine, RunCounters};
pub use summary::SummaryFindings;
pub use workspace::{OutputCategory, OutputWorkspace};
