use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

pub use stegtriage_runner::RunnerError;

use crate::exit_codes::ExitCode;

/// Library-level error type with user-friendly reporting.
///
/// Tool-level outcomes (warnings, timeouts, tool errors, missing tools) are
/// NOT errors; they are statuses reported by the execution wrapper. The
/// variants here are the escalation points of a run.
///
/// | Category | Escalation |
/// |----------|------------|
/// | `Validation` | input rejected before any workspace exists |
/// | `Workspace` | directory or file creation failed |
/// | `Invocation` | malformed step (logged, step skipped) |
/// | `Config` | configuration could not be loaded |
/// | `Interrupted` | operator chose to quit after Ctrl-C |
///
/// Library code returns `StegError` and does NOT call `std::process::exit()`.
#[derive(Error, Debug)]
pub enum StegError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Workspace error: {0}")]
    Workspace(#[from] WorkspaceError),

    #[error("Invalid tool invocation: {0}")]
    Invocation(#[from] InvocationError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Runner error: {0}")]
    Runner(#[from] RunnerError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Analysis interrupted by operator")]
    Interrupted,
}

/// Trait for providing user-friendly error reporting with context and suggestions
pub trait UserFriendlyError {
    /// Get a user-friendly error message
    fn user_message(&self) -> String;

    /// Get contextual information about the error
    fn context(&self) -> Option<String>;

    /// Get suggested actions to resolve the error
    fn suggestions(&self) -> Vec<String>;

    /// Get the error category for grouping similar errors
    fn category(&self) -> ErrorCategory;
}

/// Categories of errors for better organization and handling
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Validation,
    FileSystem,
    ToolExecution,
    Security,
    Interrupt,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "Configuration"),
            Self::Validation => write!(f, "Validation"),
            Self::FileSystem => write!(f, "File System"),
            Self::ToolExecution => write!(f, "Tool Execution"),
            Self::Security => write!(f, "Security"),
            Self::Interrupt => write!(f, "Interrupt"),
        }
    }
}

// ============================================================================
// Input validation
// ============================================================================

/// Input file rejected before analysis.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("File not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Not a regular file: {}", path.display())]
    NotAFile { path: PathBuf },

    #[error("File is not readable: {} ({reason})", path.display())]
    Unreadable { path: PathBuf, reason: String },

    #[error("File is empty: {}", path.display())]
    Empty { path: PathBuf },

    #[error("File is too large: {} ({size} bytes > {limit} bytes)", path.display())]
    TooLarge {
        path: PathBuf,
        size: u64,
        limit: u64,
    },

    #[error("File rejected by security policy: {} ({reason})", path.display())]
    PolicyRejected { path: PathBuf, reason: String },
}

impl ValidationError {
    /// The offending input path.
    #[must_use]
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::NotFound { path }
            | Self::NotAFile { path }
            | Self::Unreadable { path, .. }
            | Self::Empty { path }
            | Self::TooLarge { path, .. }
            | Self::PolicyRejected { path, .. } => path,
        }
    }
}

impl UserFriendlyError for ValidationError {
    fn user_message(&self) -> String {
        match self {
            Self::NotFound { path } => format!("Input file does not exist: {}", path.display()),
            Self::NotAFile { path } => {
                format!("Input is a directory or special file: {}", path.display())
            }
            Self::Unreadable { path, reason } => {
                format!("Cannot read input file {}: {reason}", path.display())
            }
            Self::Empty { path } => format!("Input file is empty: {}", path.display()),
            Self::TooLarge { path, size, limit } => format!(
                "Input file {} is {size} bytes, above the {limit} byte limit",
                path.display()
            ),
            Self::PolicyRejected { path, reason } => format!(
                "Input file {} was rejected by the paranoid security level: {reason}",
                path.display()
            ),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::PolicyRejected { .. } => Some(
                "The paranoid security level refuses executables and scripts so that analysis tools never touch runnable content.".to_string(),
            ),
            Self::TooLarge { .. } => Some(
                "Large inputs can make carving and string extraction run for a very long time.".to_string(),
            ),
            _ => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::NotFound { .. } | Self::NotAFile { .. } => vec![
                "Check the path for typos".to_string(),
                "Use -- before file names that start with a dash".to_string(),
            ],
            Self::Unreadable { .. } => {
                vec!["Check file permissions (the file must be readable by this user)".to_string()]
            }
            Self::Empty { .. } => vec!["Nothing to analyse; verify the evidence copy".to_string()],
            Self::TooLarge { .. } => vec![
                "Raise max_file_size in [defaults] of .stegtriage/config.toml".to_string(),
                "Use --security minimal to skip size checks".to_string(),
            ],
            Self::PolicyRejected { .. } => vec![
                "Analyse the file inside an isolated VM".to_string(),
                "Use --security normal if running the tools on this file is acceptable".to_string(),
            ],
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::PolicyRejected { .. } => ErrorCategory::Security,
            _ => ErrorCategory::Validation,
        }
    }
}

// ============================================================================
// Workspace
// ============================================================================

/// Output workspace creation or write failure.
#[derive(Error, Debug)]
pub enum WorkspaceError {
    #[error("Failed to create directory {}: {reason}", path.display())]
    CreateDir { path: PathBuf, reason: String },

    #[error("Failed to write {}: {reason}", path.display())]
    WriteFile { path: PathBuf, reason: String },

    #[error("Invalid workspace name derived from {input}")]
    InvalidName { input: String },
}

impl UserFriendlyError for WorkspaceError {
    fn user_message(&self) -> String {
        match self {
            Self::CreateDir { path, reason } => {
                format!("Could not create output directory {}: {reason}", path.display())
            }
            Self::WriteFile { path, reason } => {
                format!("Could not write output file {}: {reason}", path.display())
            }
            Self::InvalidName { input } => {
                format!("Could not derive a workspace name from '{input}'")
            }
        }
    }

    fn context(&self) -> Option<String> {
        Some("Each analysed file gets its own directory under the output root.".to_string())
    }

    fn suggestions(&self) -> Vec<String> {
        vec![
            "Check that the output directory is writable".to_string(),
            "Choose another location with --output-dir".to_string(),
            "Check free disk space".to_string(),
        ]
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::FileSystem
    }
}

// ============================================================================
// Invocation
// ============================================================================

/// Malformed tool invocation.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum InvocationError {
    #[error("tool name is empty")]
    EmptyName,

    #[error("command for tool '{name}' is empty")]
    EmptyCommand { name: String },
}

impl UserFriendlyError for InvocationError {
    fn user_message(&self) -> String {
        self.to_string()
    }

    fn context(&self) -> Option<String> {
        Some("The step was skipped; the rest of the phase continues.".to_string())
    }

    fn suggestions(&self) -> Vec<String> {
        Vec::new()
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::ToolExecution
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration file: {0}")]
    InvalidFile(String),

    #[error("Invalid configuration value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration discovery failed: {reason}")]
    DiscoveryFailed { reason: String },
}

impl UserFriendlyError for ConfigError {
    fn user_message(&self) -> String {
        match self {
            Self::InvalidFile(reason) => {
                format!("Configuration file has invalid format: {reason}")
            }
            Self::InvalidValue { key, value } => {
                format!("Configuration '{key}' has invalid value: {value}")
            }
            Self::DiscoveryFailed { reason } => {
                format!("Failed to discover configuration: {reason}")
            }
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::InvalidFile(_) => Some(
                "Configuration files must be valid TOML with optional [defaults] and [tools.<name>] sections."
                    .to_string(),
            ),
            Self::InvalidValue { key, .. } => Some(format!(
                "The '{key}' configuration option has specific format requirements."
            )),
            Self::DiscoveryFailed { .. } => Some(
                "stegtriage searches for .stegtriage/config.toml starting from the current directory upward."
                    .to_string(),
            ),
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidFile(_) => vec![
                "Check the TOML syntax using a TOML validator".to_string(),
                "Use --config <path> to point at a known-good file".to_string(),
            ],
            Self::InvalidValue { key, .. } => match key.as_str() {
                "security_level" => {
                    vec!["Use one of: minimal, normal, paranoid".to_string()]
                }
                "exit_code_one" => vec!["Use one of: success, warning, error".to_string()],
                "tool_timeout" | "timeout" => {
                    vec!["Use a positive number of seconds".to_string()]
                }
                _ => vec!["Remove the option to use the default value".to_string()],
            },
            Self::DiscoveryFailed { .. } => vec![
                "Check read permissions on the current directory tree".to_string(),
                "Use --config <path> to specify the configuration file explicitly".to_string(),
            ],
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Configuration
    }
}

impl UserFriendlyError for RunnerError {
    fn user_message(&self) -> String {
        match self {
            RunnerError::ProgramNotFound { program } => {
                format!("'{program}' disappeared from PATH between probe and execution")
            }
            other => other.to_string(),
        }
    }

    fn context(&self) -> Option<String> {
        None
    }

    fn suggestions(&self) -> Vec<String> {
        vec!["Run with --check-deps to list missing tools".to_string()]
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::ToolExecution
    }
}

impl UserFriendlyError for StegError {
    fn user_message(&self) -> String {
        match self {
            Self::Validation(err) => err.user_message(),
            Self::Workspace(err) => err.user_message(),
            Self::Invocation(err) => err.user_message(),
            Self::Config(err) => err.user_message(),
            Self::Runner(err) => err.user_message(),
            Self::Io(err) => format!("File system operation failed: {err}"),
            Self::Interrupted => "Analysis interrupted by operator".to_string(),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::Validation(err) => err.context(),
            Self::Workspace(err) => err.context(),
            Self::Invocation(err) => err.context(),
            Self::Config(err) => err.context(),
            Self::Runner(err) => err.context(),
            Self::Io(_) => None,
            Self::Interrupted => {
                Some("Artifacts written before the interrupt are kept.".to_string())
            }
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Validation(err) => err.suggestions(),
            Self::Workspace(err) => err.suggestions(),
            Self::Invocation(err) => err.suggestions(),
            Self::Config(err) => err.suggestions(),
            Self::Runner(err) => err.suggestions(),
            Self::Io(_) => vec!["Check permissions and free disk space".to_string()],
            Self::Interrupted => Vec::new(),
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation(err) => err.category(),
            Self::Workspace(err) => err.category(),
            Self::Invocation(err) => err.category(),
            Self::Config(err) => err.category(),
            Self::Runner(err) => err.category(),
            Self::Io(_) => ErrorCategory::FileSystem,
            Self::Interrupted => ErrorCategory::Interrupt,
        }
    }
}

impl StegError {
    /// Get a user-friendly error message with context and actionable suggestions.
    ///
    /// ```text
    /// Error: <user message>
    ///
    /// Context: <context if available>
    ///
    /// Suggestions:
    ///   • <suggestion 1>
    /// ```
    #[must_use]
    pub fn display_for_user(&self) -> String {
        let mut out = format!("Error: {}", self.user_message());
        if let Some(context) = self.context() {
            out.push_str(&format!("\n\nContext: {context}"));
        }
        let suggestions = self.suggestions();
        if !suggestions.is_empty() {
            out.push_str("\n\nSuggestions:");
            for suggestion in suggestions {
                out.push_str(&format!("\n  • {suggestion}"));
            }
        }
        out
    }

    /// Map this error to the process exit code.
    #[must_use]
    pub const fn to_exit_code(&self) -> ExitCode {
        match self {
            Self::Interrupted => ExitCode::INTERRUPTED,
            _ => ExitCode::FAILURE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_rejection_is_security_category() {
        let err = ValidationError::PolicyRejected {
            path: PathBuf::from("payload.sh"),
            reason: "extension .sh is denied".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Security);
        assert_eq!(err.path(), &PathBuf::from("payload.sh"));
        assert!(err.user_message().contains("paranoid"));
    }

    #[test]
    fn test_display_for_user_includes_suggestions() {
        let err = StegError::from(ValidationError::Empty {
            path: PathBuf::from("empty.png"),
        });
        let shown = err.display_for_user();
        assert!(shown.starts_with("Error: Input file is empty"));
        assert!(shown.contains("Suggestions:"));
    }

    #[test]
    fn test_exit_code_mapping() {
        assert_eq!(StegError::Interrupted.to_exit_code(), ExitCode::INTERRUPTED);
        let err = StegError::from(InvocationError::EmptyName);
        assert_eq!(err.to_exit_code(), ExitCode::FAILURE);
    }

    #[test]
    fn test_config_error_suggestions_by_key() {
        let err = ConfigError::InvalidValue {
            key: "security_level".to_string(),
            value: "strict".to_string(),
        };
        assert!(err.suggestions()[0].contains("paranoid"));
    }
}
