use std::path::PathBuf;

use stegtriage_utils::types::SecurityLevel;

/// Configuration values supplied on the command line.
///
/// `None` means "not given"; lower-precedence sources then apply.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub config_path: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub tool_timeout: Option<u64>,
    pub security_level: Option<SecurityLevel>,
}
