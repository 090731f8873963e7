//! Command-line interface for stegtriage
//!
//! ## Module Structure
//!
//! - `args`: CLI argument definitions and parsing (clap)
//! - `run`: entry point and mode dispatch
//! - `prompt`: terminal prompter for interactive mode

pub mod args;
mod prompt;
mod run;

pub use args::{Cli, normalize_args, parse_from};
pub use prompt::StdioPrompter;
pub use run::{run, run_with_args};
