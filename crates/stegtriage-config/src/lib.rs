//! Configuration management for stegtriage
//!
//! Hierarchical configuration with discovery and precedence:
//! CLI > environment > file > defaults. Configuration files are TOML with
//! optional `[defaults]` and `[tools.<name>]` sections.

pub mod config;

pub use config::{
    CliArgs, Config, DEFAULT_KILL_GRACE_MS, DEFAULT_MAX_FILE_SIZE, DEFAULT_OUTPUT_DIR,
    DEFAULT_TOOL_TIMEOUT_SECS, DEFAULT_WORDLIST, Defaults, OUTPUT_DIR_ENV, ToolOverride,
};
