use anyhow::Result;

use stegtriage_utils::error::ConfigError;

use super::Config;

impl Config {
    /// Validate the effective configuration.
    ///
    /// Budgets and limits must be positive; a zero timeout would classify
    /// every tool as timed out before it produced output.
    pub fn validate(&self) -> Result<()> {
        if self.defaults.tool_timeout == 0 {
            return Err(ConfigError::InvalidValue {
                key: "tool_timeout".to_string(),
                value: "0 (must be at least 1 second)".to_string(),
            }
            .into());
        }

        if self.defaults.max_file_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "max_file_size".to_string(),
                value: "0 (must be greater than 0)".to_string(),
            }
            .into());
        }

        if self.defaults.output_dir.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "output_dir".to_string(),
                value: "empty path".to_string(),
            }
            .into());
        }

        for (name, tool) in &self.tools {
            if name.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: "tools".to_string(),
                    value: "empty tool name".to_string(),
                }
                .into());
            }
            if tool.timeout == Some(0) {
                return Err(ConfigError::InvalidValue {
                    key: "timeout".to_string(),
                    value: format!("0 for tool '{name}' (must be at least 1 second)"),
                }
                .into());
            }
        }

        Ok(())
    }
}
