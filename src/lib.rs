//! stegtriage - forensic triage orchestrator for suspected steganography
//!
//! Runs a fixed catalogue of external forensic tools against one file at a
//! time, in six ordered phases, and stores every transcript in a timestamped
//! workspace. Findings are advisory: stegtriage reports what the tools said
//! and never decides whether a file carries hidden data.
//!
//! stegtriage can be used in two ways:
//! - **CLI**: `stegtriage [OPTIONS] <FILE>...`
//! - **Library**: build an [`Engine`] and drive runs directly
//!
//! # Quick Start (Library)
//!
//! ```rust,no_run
//! use stegtriage::{Config, Engine, QuitOnInterrupt};
//! use std::path::Path;
//!
//! let engine = Engine::native(Config::default(), None);
//! let run = engine
//!     .analyze(Path::new("suspicious.png"), &mut QuitOnInterrupt)
//!     .expect("analysis failed");
//! println!("Results in {}", run.workspace().root().display());
//! ```
//!
//! # Stable Public API
//!
//! - [`Engine`], [`AnalysisRun`] - run orchestration
//! - [`Config`], [`CliArgs`] - configuration with discovery and precedence
//! - [`StegError`], [`ExitCode`] - errors and exit codes
//! - [`PhaseId`], [`ContentCategory`], [`ToolStatus`] - shared domain types
//!
//! Crate modules are re-exported below for embedding but are not covered by
//! semver guarantees.

pub mod cli;

pub use stegtriage_config::{CliArgs, Config};
pub use stegtriage_engine::{
    AnalysisRun, BatchReport, DependencyReport, Engine, InterruptPolicy, Prompter,
    QuitOnInterrupt, SummaryFindings,
};
pub use stegtriage_utils::error::{ErrorCategory, StegError, UserFriendlyError};
pub use stegtriage_utils::exit_codes::ExitCode;
pub use stegtriage_utils::types::{ContentCategory, PhaseId, SecurityLevel, ToolStatus};

#[doc(hidden)]
pub use stegtriage_config as config;
#[doc(hidden)]
pub use stegtriage_engine as engine;
#[doc(hidden)]
pub use stegtriage_runner as runner;
#[doc(hidden)]
pub use stegtriage_utils as utils;

#[cfg(any(test, feature = "test-utils"))]
#[doc(hidden)]
pub use stegtriage_engine::test_support;
