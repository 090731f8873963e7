//! Exit code constants for stegtriage.
//!
//! # Exit Code Table
//!
//! | Code | Constant | Description |
//! |------|----------|-------------|
//! | 0 | `SUCCESS` | Analysis completed (tool warnings/errors do not change this) |
//! | 1 | `FAILURE` | Usage error, validation failure, or no file in a batch succeeded |
//! | 130 | `INTERRUPTED` | Operator interrupt |

/// Process exit code.
///
/// Use the named constants, or [`as_i32()`](Self::as_i32) to get the numeric
/// value for `std::process::exit()`.
///
/// ```rust
/// use stegtriage_utils::exit_codes::ExitCode;
///
/// assert_eq!(ExitCode::SUCCESS.as_i32(), 0);
/// assert_eq!(ExitCode::INTERRUPTED, ExitCode::from_i32(130));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(i32);

impl ExitCode {
    /// Success - analysis completed
    pub const SUCCESS: ExitCode = ExitCode(0);

    /// Failure - usage error, validation failure, or an entirely failed batch
    pub const FAILURE: ExitCode = ExitCode(1);

    /// Interrupted - operator pressed Ctrl-C and chose to quit
    pub const INTERRUPTED: ExitCode = ExitCode(stegtriage_runner::INTERRUPT_EXIT_CODE);

    /// Get the numeric exit code value.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    /// Create an ExitCode from a raw i32 value.
    #[must_use]
    pub const fn from_i32(code: i32) -> Self {
        ExitCode(code)
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_values() {
        assert_eq!(ExitCode::SUCCESS.as_i32(), 0);
        assert_eq!(ExitCode::FAILURE.as_i32(), 1);
        assert_eq!(i32::from(ExitCode::INTERRUPTED), 130);
    }
}
