use std::collections::BTreeSet;
use std::ffi::OsString;
use std::process::Command;
use tokio::process::Command as TokioCommand;

/// Placeholder shown in place of secret arguments.
pub const REDACTED_ARG: &str = "******";

// ============================================================================
// CommandSpec - argv-style Process Execution Specification
// ============================================================================

/// Specification for an external tool invocation.
///
/// All process execution goes through this type to ensure argv-style
/// invocation. File names taken from evidence files routinely contain spaces,
/// quotes and shell metacharacters, so arguments are passed as discrete
/// elements and never evaluated by a shell.
///
/// Arguments registered with [`secret_arg`](Self::secret_arg) are passed to
/// the process verbatim but rendered as `******` by [`display`](Self::display),
/// which is what ends up in artifact headers and logs.
///
/// # Example
///
/// ```rust
/// use stegtriage_runner::CommandSpec;
/// use std::ffi::OsString;
///
/// let cmd = CommandSpec::new("steghide")
///     .args(["extract", "-sf", "cover image.jpg", "-p"])
///     .secret_arg("hunter2");
///
/// assert_eq!(cmd.program, OsString::from("steghide"));
/// assert_eq!(cmd.args.len(), 5);
/// assert_eq!(cmd.display(), "steghide extract -sf 'cover image.jpg' -p '******'");
/// ```
#[derive(Debug, Clone, Default)]
pub struct CommandSpec {
    /// The program to execute
    pub program: OsString,
    /// Arguments as discrete elements (NOT shell strings)
    pub args: Vec<OsString>,
    /// Indices into `args` that must never be displayed
    secret_indices: BTreeSet<usize>,
}

impl CommandSpec {
    /// Create a new `CommandSpec` with the given program.
    #[must_use]
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    /// Add a single argument to the command.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments to the command.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Add an argument that is passed to the process but redacted on display.
    #[must_use]
    pub fn secret_arg(mut self, arg: impl Into<OsString>) -> Self {
        self.secret_indices.insert(self.args.len());
        self.args.push(arg.into());
        self
    }

    /// The program as a lossy UTF-8 string.
    #[must_use]
    pub fn program_name(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }

    /// Whether the argument at `index` was registered as secret.
    #[must_use]
    pub fn is_secret(&self, index: usize) -> bool {
        self.secret_indices.contains(&index)
    }

    /// Render the command as a shell-quoted line with secrets redacted.
    ///
    /// The result is for humans only; it is never executed.
    #[must_use]
    pub fn display(&self) -> String {
        let mut words = Vec::with_capacity(self.args.len() + 1);
        words.push(self.program_name());
        for (index, arg) in self.args.iter().enumerate() {
            if self.is_secret(index) {
                words.push(REDACTED_ARG.to_string());
            } else {
                words.push(arg.to_string_lossy().into_owned());
            }
        }
        shell_words::join(words)
    }

    /// Blocking command, for short synchronous probes (e.g. `file --mime-type`).
    #[must_use]
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }

    /// Async command for budgeted execution.
    ///
    /// Built from [`to_command`](Self::to_command) so both paths see the
    /// same argv.
    #[must_use]
    pub fn to_tokio_command(&self) -> TokioCommand {
        TokioCommand::from(self.to_command())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_spec_new() {
        let cmd = CommandSpec::new("exiftool");
        assert_eq!(cmd.program, OsString::from("exiftool"));
        assert!(cmd.args.is_empty());
        assert_eq!(cmd.display(), "exiftool");
    }

    #[test]
    fn test_command_spec_builder_chain() {
        let cmd = CommandSpec::new("binwalk")
            .arg("-e")
            .args(["-C", "/tmp/out"])
            .arg("evidence.bin");

        assert_eq!(cmd.program_name(), "binwalk");
        assert_eq!(cmd.args.len(), 4);
        assert_eq!(cmd.to_command().get_args().count(), 4);
    }

    #[test]
    fn test_display_quotes_arguments() {
        let cmd = CommandSpec::new("strings")
            .args(["-a", "-n", "6"])
            .arg("my file (1).png");
        assert_eq!(cmd.display(), "strings -a -n 6 'my file (1).png'");
    }

    #[test]
    fn test_secret_args_redacted_on_display_only() {
        let cmd = CommandSpec::new("outguess")
            .arg("-k")
            .secret_arg("s3cret pass")
            .args(["-r", "in.jpg", "out.bin"]);

        assert!(cmd.is_secret(1));
        assert!(!cmd.is_secret(0));
        assert_eq!(cmd.args[1], OsString::from("s3cret pass"));

        let shown = cmd.display();
        assert!(!shown.contains("s3cret"));
        assert!(shown.contains(REDACTED_ARG));
    }

    #[test]
    fn test_command_spec_shell_metacharacters_preserved() {
        let cmd = CommandSpec::new("file")
            .arg("$(whoami).png")
            .arg("`id`.jpg")
            .arg("a;b|c&d");

        assert_eq!(cmd.args[0], OsString::from("$(whoami).png"));
        assert_eq!(cmd.args[1], OsString::from("`id`.jpg"));
        assert_eq!(cmd.args[2], OsString::from("a;b|c&d"));
    }

    #[test]
    fn test_command_spec_default_is_empty() {
        let cmd = CommandSpec::default();
        assert_eq!(cmd.program, OsString::new());
        assert!(cmd.args.is_empty());
        assert_eq!(cmd.program_name(), "");
    }
}
