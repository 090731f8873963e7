//! Logging and console status output for stegtriage
//!
//! Structured diagnostics go through `tracing`; the per-tool status lines and
//! run tallies an analyst watches are printed directly with colour.

use std::io::IsTerminal;
use std::time::Duration;

use crossterm::style::{Attribute, Color, Stylize};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::types::ToolStatus;

/// Check if colored output should be used.
///
/// Returns true only if:
/// - stdout is a terminal (TTY)
/// - NO_COLOR environment variable is not set
#[must_use]
pub fn use_color() -> bool {
    std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none()
}

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` wins when set. Otherwise stegtriage crates log at info, which
/// echoes every INFO/WARN/ERROR run-log line, and `verbose` adds DEBUG.
/// Events go to stderr so they never mix with tool output.
pub fn init_tracing(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directives(verbose)))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbose)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_line_number(false)
                .with_file(false)
                .with_ansi(std::io::stderr().is_terminal())
                .compact(),
        )
        .try_init()?;

    Ok(())
}

/// Filter used when `RUST_LOG` is unset.
fn default_directives(verbose: bool) -> String {
    let level = if verbose { "debug" } else { "info" };
    let crates = ["stegtriage", "stegtriage_engine", "stegtriage_runner", "stegtriage_config"];
    let mut directives: Vec<String> = crates.iter().map(|c| format!("{c}={level}")).collect();
    directives.push("warn".to_string());
    directives.join(",")
}

fn style(text: &str, color: Color, bold: bool) -> String {
    if use_color() {
        let mut styled = text.with(color);
        if bold {
            styled = styled.attribute(Attribute::Bold);
        }
        format!("{styled}")
    } else {
        text.to_string()
    }
}

const fn status_color(status: ToolStatus) -> Color {
    match status {
        ToolStatus::Success => Color::Green,
        ToolStatus::Warning | ToolStatus::Interrupted => Color::Yellow,
        ToolStatus::Timeout => Color::Magenta,
        ToolStatus::Error => Color::Red,
        ToolStatus::SkippedUnavailable => Color::DarkGrey,
    }
}

/// Format one tool status line, e.g. `✓ exiftool [success] 0.4s`.
#[must_use]
pub fn format_tool_status(name: &str, status: ToolStatus, duration: Option<Duration>) -> String {
    let color = status_color(status);
    let timing = duration
        .map(|d| format!(" {:.1}s", d.as_secs_f64()))
        .unwrap_or_default();
    format!(
        "{} {} {}{}",
        style(status.glyph(), color, true),
        style(name, Color::Reset, true),
        style(&format!("[{status}]"), color, false),
        timing
    )
}

pub fn print_tool_status(name: &str, status: ToolStatus, duration: Option<Duration>) {
    println!("{}", format_tool_status(name, status, duration));
}

/// Print a phase banner.
pub fn print_phase_banner(title: &str) {
    println!();
    println!("{}", style(&format!("── {title} ──"), Color::Cyan, true));
}

/// Print the end-of-run tally.
pub fn print_run_tally(label: &str, errors: u32, warnings: u32, timeouts: u32, skipped: u32) {
    let errors_text = format!("{errors} error(s)");
    let warnings_text = format!("{warnings} warning(s)");
    println!(
        "{} {}: {}, {}, {} timeout(s), {} skipped",
        style("▸", Color::Cyan, true),
        style(label, Color::Reset, true),
        if errors > 0 {
            style(&errors_text, Color::Red, true)
        } else {
            errors_text
        },
        if warnings > 0 {
            style(&warnings_text, Color::Yellow, true)
        } else {
            warnings_text
        },
        timeouts,
        skipped
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_tool_status_plain() {
        // Test harness stdout is not a TTY, so no escape codes
        let line = format_tool_status("zsteg", ToolStatus::Warning, Some(Duration::from_millis(1500)));
        assert_eq!(line, "⚠ zsteg [warning] 1.5s");
    }

    #[test]
    fn test_format_tool_status_without_duration() {
        let line = format_tool_status("foremost", ToolStatus::SkippedUnavailable, None);
        assert_eq!(line, "- foremost [skipped-unavailable]");
    }

    #[test]
    fn test_default_directives_echo_info_and_above() {
        let quiet = default_directives(false);
        assert!(quiet.contains("stegtriage_engine=info"));
        assert!(!quiet.contains("debug"));
        assert!(EnvFilter::try_new(&quiet).is_ok());

        let verbose = default_directives(true);
        assert!(verbose.contains("stegtriage_engine=debug"));
        assert!(verbose.ends_with(",warn"));
        assert!(EnvFilter::try_new(&verbose).is_ok());
    }
}
