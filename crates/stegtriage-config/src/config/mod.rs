//! Configuration model and accessors

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::time::Duration;

use stegtriage_utils::types::{ConfigSource, ExitOnePolicy};

mod cli_args;
mod discovery;
mod model;
mod validation;

pub use cli_args::CliArgs;
pub use model::{
    DEFAULT_KILL_GRACE_MS, DEFAULT_MAX_FILE_SIZE, DEFAULT_OUTPUT_DIR, DEFAULT_TOOL_TIMEOUT_SECS,
    DEFAULT_WORDLIST, Defaults, OUTPUT_DIR_ENV, ToolOverride,
};

/// Effective configuration for one stegtriage process.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub defaults: Defaults,
    /// Per-tool overrides keyed by tool name
    pub tools: BTreeMap<String, ToolOverride>,
    /// The file the values were loaded from, if any
    pub config_path: Option<PathBuf>,
    pub source_attribution: HashMap<String, ConfigSource>,
}

impl Config {
    /// First value of `field` among the `[tools.<key>]` entries, in order.
    fn tool_setting<T>(&self, keys: &[&str], field: impl Fn(&ToolOverride) -> Option<T>) -> Option<T> {
        keys.iter()
            .find_map(|key| self.tools.get(*key).and_then(&field))
    }

    /// Time budget for `tool`, honouring `[tools.<name>] timeout`.
    #[must_use]
    pub fn tool_timeout(&self, tool: &str) -> Duration {
        self.step_timeout(tool, tool)
    }

    /// Time budget for a step that runs `binary`.
    ///
    /// Each field resolves on its own, so a step entry that only sets
    /// `exit_code_one` still inherits the binary's `timeout`.
    #[must_use]
    pub fn step_timeout(&self, step: &str, binary: &str) -> Duration {
        let secs = self
            .tool_setting(&[step, binary], |o| o.timeout)
            .unwrap_or(self.defaults.tool_timeout);
        Duration::from_secs(secs)
    }

    /// How exit code 1 is classified for `tool`.
    #[must_use]
    pub fn exit_one_policy(&self, tool: &str) -> ExitOnePolicy {
        self.step_exit_one_policy(tool, tool)
    }

    /// Exit-code-1 policy for a step that runs `binary`.
    #[must_use]
    pub fn step_exit_one_policy(&self, step: &str, binary: &str) -> ExitOnePolicy {
        self.tool_setting(&[step, binary], |o| o.exit_code_one)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn kill_grace(&self) -> Duration {
        Duration::from_millis(self.defaults.kill_grace_ms)
    }

    /// Source of a `[defaults]` key; unknown keys report `default`.
    #[must_use]
    pub fn source_of(&self, key: &str) -> ConfigSource {
        self.source_attribution
            .get(key)
            .cloned()
            .unwrap_or(ConfigSource::Default)
    }

    /// Effective `[defaults]` values with their sources, in a stable order.
    #[must_use]
    pub fn effective_config(&self) -> Vec<(&'static str, String, ConfigSource)> {
        let d = &self.defaults;
        vec![
            ("output_dir", d.output_dir.display().to_string(), self.source_of("output_dir")),
            ("tool_timeout", d.tool_timeout.to_string(), self.source_of("tool_timeout")),
            ("security_level", d.security_level.to_string(), self.source_of("security_level")),
            ("max_file_size", d.max_file_size.to_string(), self.source_of("max_file_size")),
            ("kill_grace_ms", d.kill_grace_ms.to_string(), self.source_of("kill_grace_ms")),
            ("wordlist", d.wordlist.display().to_string(), self.source_of("wordlist")),
        ]
    }
}
