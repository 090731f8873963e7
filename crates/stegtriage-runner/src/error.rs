//! Error types for runner module

use thiserror::Error;

/// Process execution errors.
///
/// Exit codes, time-budget expiry and operator interrupts are not errors; they
/// are reported through [`ProcessOutput`](crate::ProcessOutput). These variants
/// cover the cases where no meaningful outcome exists.
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Program not found: {program}")]
    ProgramNotFound { program: String },

    #[error("Failed to spawn {program}: {reason}")]
    SpawnFailed { program: String, reason: String },

    #[error("Failed to wait for {program}: {reason}")]
    WaitFailed { program: String, reason: String },

    #[error("Failed to prepare output sink: {reason}")]
    OutputSink { reason: String },

    #[error("Runner configuration invalid: {reason}")]
    ConfigurationInvalid { reason: String },
}
