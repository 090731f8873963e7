//! Process execution for stegtriage
//!
//! Runs one external analysis tool at a time under a wall-clock budget, with
//! stdout and stderr merged into a caller-supplied file.
//!
//! # Security Model
//!
//! All process execution goes through [`CommandSpec`] to ensure argv-style
//! invocation. Evidence file names are attacker-controlled, so they are never
//! interpolated into shell strings.

pub mod command_spec;
pub mod error;
pub mod interrupt;
pub mod native;
mod platform;
pub mod process;

pub use command_spec::{CommandSpec, REDACTED_ARG};
pub use error::RunnerError;
pub use interrupt::{BusyGuard, INTERRUPT_EXIT_CODE, InterruptFlag};
pub use native::{DEFAULT_KILL_GRACE, NativeRunner};
pub use process::{ProcessOutput, ProcessRunner};
