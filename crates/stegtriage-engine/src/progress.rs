use std::io::IsTerminal;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

const SPINNER_TEMPLATE: &str = "[{elapsed_precise}] {spinner} {prefix:.bold.dim} {wide_msg}";
const STEADY_TICK_MS: u64 = 100;

/// Spinner shown on stderr while a tool runs.
///
/// Inert when disabled or when stderr is not a terminal.
pub struct ToolSpinner {
    bar: Option<ProgressBar>,
}

impl ToolSpinner {
    #[must_use]
    pub fn start(enabled: bool, tool: &str, command: &str) -> Self {
        if !enabled || !std::io::stderr().is_terminal() {
            return Self { bar: None };
        }

        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template(SPINNER_TEMPLATE) {
            bar.set_style(style.tick_strings(&[".  ", ".. ", "...", " ..", "  .", "   "]));
        }
        bar.set_prefix(tool.to_string());
        bar.set_message(command.to_string());
        bar.enable_steady_tick(Duration::from_millis(STEADY_TICK_MS));

        Self { bar: Some(bar) }
    }

    /// Remove the spinner so the status line prints cleanly.
    pub fn finish(self) {
        if let Some(bar) = self.bar {
            bar.finish_and_clear();
        }
    }
}
