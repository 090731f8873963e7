//! Tool transcript format
//!
//! Every execution appends one self-describing section to the tool's artifact:
//!
//! ```text
//! ===== stegtriage: exiftool =====
//! Command: exiftool -a -u -g1 cover.png
//! Category: Metadata
//! Started: 2024-05-01 12:30:45
//! Time budget: 300s
//! ----- output -----
//! <merged stdout/stderr>
//! ----- end of output -----
//! Duration: 0.41s
//! Exit code: 0
//! Status: success
//! ```
//!
//! Searches for findings must look at bodies only; headers contain paths such
//! as `Extracted/binwalk` that would otherwise match.

use chrono::{DateTime, Local};
use std::io::{self, Write};
use std::time::Duration;

use stegtriage_utils::types::ToolStatus;

const BEGIN_PREFIX: &str = "===== stegtriage: ";
const BEGIN_SUFFIX: &str = " =====";
const OUTPUT_MARKER: &str = "----- output -----";
const END_MARKER: &str = "----- end of output -----";

/// Metadata written before a tool runs.
#[derive(Debug, Clone)]
pub struct SectionHeader<'a> {
    pub tool: &'a str,
    /// Redacted, display-only command line
    pub command: &'a str,
    pub category: &'a str,
    pub started_at: DateTime<Local>,
    pub budget: Duration,
}

impl SectionHeader<'_> {
    pub fn write_to(&self, out: &mut impl Write) -> io::Result<()> {
        write!(
            out,
            "{BEGIN_PREFIX}{}{BEGIN_SUFFIX}\nCommand: {}\nCategory: {}\nStarted: {}\nTime budget: {}s\n{OUTPUT_MARKER}\n",
            self.tool,
            self.command,
            self.category,
            self.started_at.format("%Y-%m-%d %H:%M:%S"),
            self.budget.as_secs()
        )?;
        out.flush()
    }
}

/// Outcome written after a tool ends.
#[derive(Debug, Clone, Copy)]
pub struct SectionFooter {
    pub duration: Duration,
    pub exit_code: Option<i32>,
    pub status: ToolStatus,
}

impl SectionFooter {
    pub fn write_to(&self, out: &mut impl Write) -> io::Result<()> {
        let exit_code = self
            .exit_code
            .map_or_else(|| "none".to_string(), |code| code.to_string());
        write!(
            out,
            "\n{END_MARKER}\nDuration: {:.2}s\nExit code: {exit_code}\nStatus: {}\n\n",
            self.duration.as_secs_f64(),
            self.status
        )?;
        out.flush()
    }
}

/// One parsed execution section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactSection {
    pub tool: String,
    pub command: String,
    pub body: String,
    pub exit_code: Option<i32>,
    /// `None` when the footer is missing (process still running or crashed)
    pub status: Option<ToolStatus>,
}

enum ParseState {
    Outside,
    Header,
    Body,
    Footer,
}

/// Split an artifact into its execution sections.
#[must_use]
pub fn parse_sections(text: &str) -> Vec<ArtifactSection> {
    let mut sections: Vec<ArtifactSection> = Vec::new();
    let mut state = ParseState::Outside;

    for line in text.lines() {
        if let Some(tool) = line
            .strip_prefix(BEGIN_PREFIX)
            .and_then(|rest| rest.strip_suffix(BEGIN_SUFFIX))
            && !matches!(state, ParseState::Body)
        {
            sections.push(ArtifactSection {
                tool: tool.to_string(),
                ..ArtifactSection::default()
            });
            state = ParseState::Header;
            continue;
        }

        let Some(section) = sections.last_mut() else {
            continue;
        };

        match state {
            ParseState::Outside => {}
            ParseState::Header => {
                if line == OUTPUT_MARKER {
                    state = ParseState::Body;
                } else if let Some(command) = line.strip_prefix("Command: ") {
                    section.command = command.to_string();
                }
            }
            ParseState::Body => {
                if line == END_MARKER {
                    // The footer writer adds a newline before the marker
                    if section.body.ends_with('\n') {
                        section.body.pop();
                    }
                    state = ParseState::Footer;
                } else {
                    section.body.push_str(line);
                    section.body.push('\n');
                }
            }
            ParseState::Footer => {
                if let Some(code) = line.strip_prefix("Exit code: ") {
                    section.exit_code = code.trim().parse().ok();
                } else if let Some(status) = line.strip_prefix("Status: ") {
                    section.status = status.parse().ok();
                    state = ParseState::Outside;
                }
            }
        }
    }

    sections
}

/// Concatenated tool output of every section, excluding headers and footers.
///
/// Files without any section markers (written by the tools themselves) are
/// returned whole.
#[must_use]
pub fn body_text(text: &str) -> String {
    let sections = parse_sections(text);
    if sections.is_empty() {
        return text.to_string();
    }
    sections
        .into_iter()
        .map(|section| section.body)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Body of the most recent section, if any.
#[must_use]
pub fn latest_body(text: &str) -> Option<String> {
    parse_sections(text).pop().map(|section| section.body)
}
