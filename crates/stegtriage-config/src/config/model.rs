use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use stegtriage_utils::types::{ExitOnePolicy, SecurityLevel};

/// Default output root, relative to the current directory
pub const DEFAULT_OUTPUT_DIR: &str = "outputs";

/// Default per-tool wall-clock budget in seconds
pub const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 300;

/// Default input size limit for the `normal` and `paranoid` levels (2 GiB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 2 * 1024 * 1024 * 1024;

/// Default delay between SIGTERM and SIGKILL when a tool is terminated
pub const DEFAULT_KILL_GRACE_MS: u64 = 2000;

/// Default wordlist for the stegseek fallback
pub const DEFAULT_WORDLIST: &str = "/usr/share/wordlists/rockyou.txt";

/// Environment variable that overrides the output root
pub const OUTPUT_DIR_ENV: &str = "STEGTRIAGE_OUTPUT_DIR";

/// Resolved `[defaults]` values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Defaults {
    pub output_dir: PathBuf,
    pub tool_timeout: u64,
    pub security_level: SecurityLevel,
    pub max_file_size: u64,
    pub kill_grace_ms: u64,
    pub wordlist: PathBuf,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            tool_timeout: DEFAULT_TOOL_TIMEOUT_SECS,
            security_level: SecurityLevel::default(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            kill_grace_ms: DEFAULT_KILL_GRACE_MS,
            wordlist: PathBuf::from(DEFAULT_WORDLIST),
        }
    }
}

/// Per-tool overrides from `[tools.<name>]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolOverride {
    /// Time budget in seconds for this tool
    pub timeout: Option<u64>,
    /// Classification of exit code 1
    pub exit_code_one: Option<ExitOnePolicy>,
}

/// `[defaults]` as written in the file; every key optional
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct FileDefaults {
    pub output_dir: Option<PathBuf>,
    pub tool_timeout: Option<u64>,
    pub security_level: Option<SecurityLevel>,
    pub max_file_size: Option<u64>,
    pub kill_grace_ms: Option<u64>,
    pub wordlist: Option<PathBuf>,
}

/// TOML configuration file structure
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct TomlConfig {
    pub defaults: Option<FileDefaults>,
    #[serde(default)]
    pub tools: BTreeMap<String, ToolOverride>,
}
