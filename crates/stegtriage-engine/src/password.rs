//! Password attempts for steghide and outguess
//!
//! ```text
//! TryBlank ──ok──▶ Done(Recovered)
//!    │ fail
//!    ▼
//! PromptLoop ──ok──▶ Done(Recovered)
//!    │ 5 failures or empty input
//!    ▼
//! WordlistFallback ──▶ Done(Recovered | Exhausted | Unsupported)
//! ```
//!
//! Every attempt gets the next free `<tool>_attempt_NN` stem, so earlier
//! transcripts and extraction files are never overwritten.

use std::fs;
use std::path::{Path, PathBuf};

use stegtriage_runner::CommandSpec;
use stegtriage_utils::error::StegError;
use stegtriage_utils::paths::option_safe_path;
use stegtriage_utils::types::ToolStatus;

use crate::artifact::body_text;
use crate::execution::ToolInvocation;
use crate::prompt::Prompter;
use crate::run::{AnalysisRun, Engine};
use crate::workspace::{OutputCategory, attempt_stem};

/// Lower-case markers meaning "a passphrase is needed".
pub const PASSWORD_MARKERS: &[&str] = &["could not extract", "passphrase", "password"];

pub const MAX_MANUAL_ATTEMPTS: u32 = 5;

const WORDLIST_TOOL: &str = "stegseek";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordTool {
    Steghide,
    Outguess,
}

impl PasswordTool {
    pub const ALL: [PasswordTool; 2] = [Self::Steghide, Self::Outguess];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Steghide => "steghide",
            Self::Outguess => "outguess",
        }
    }

    /// Transcripts written by the phases that may ask for a passphrase.
    const fn phase_artifacts(self) -> &'static [&'static str] {
        match self {
            Self::Steghide => &["steghide", "steghide_extract"],
            Self::Outguess => &["outguess"],
        }
    }

    fn command(self, target: &Path, output: &Path, secret: &str) -> CommandSpec {
        let with_secret = |spec: CommandSpec| {
            if secret.is_empty() {
                spec.arg("")
            } else {
                spec.secret_arg(secret)
            }
        };

        match self {
            Self::Steghide => with_secret(
                CommandSpec::new("steghide")
                    .args(["extract", "-sf"])
                    .arg(target)
                    .arg("-xf")
                    .arg(output)
                    .args(["-f", "-p"]),
            ),
            Self::Outguess => with_secret(CommandSpec::new("outguess").arg("-k"))
                .arg("-r")
                .arg(target)
                .arg(output),
        }
    }
}

impl std::fmt::Display for PasswordTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasswordOutcome {
    Recovered { attempt: String, extracted: PathBuf },
    /// Every attempt failed
    Exhausted,
    /// Tool or wordlist fallback not available
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasswordState {
    TryBlank,
    PromptLoop { attempts: u32 },
    WordlistFallback,
    Done(PasswordOutcome),
}

/// Whether tool output asks for a passphrase.
#[must_use]
pub fn needs_password(text: &str) -> bool {
    let lower = body_text(text).to_lowercase();
    PASSWORD_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Tools whose phase transcripts in this run ask for a passphrase.
#[must_use]
pub fn password_candidates(run: &AnalysisRun) -> Vec<PasswordTool> {
    PasswordTool::ALL
        .into_iter()
        .filter(|tool| {
            tool.phase_artifacts().iter().any(|name| {
                let path = run
                    .workspace()
                    .artifact_path(OutputCategory::Steganography, name);
                fs::read_to_string(path).is_ok_and(|text| needs_password(&text))
            })
        })
        .collect()
}

fn non_empty_file(path: &Path) -> bool {
    fs::metadata(path).is_ok_and(|meta| meta.is_file() && meta.len() > 0)
}

impl Engine {
    fn password_attempt(
        &self,
        run: &mut AnalysisRun,
        stem_tool: &str,
        build: impl FnOnce(&Path) -> CommandSpec,
    ) -> Result<Option<PasswordOutcome>, StegError> {
        let index = run.workspace().next_attempt_index(stem_tool);
        let stem = attempt_stem(stem_tool, index);
        let extracted = run
            .workspace()
            .dir(OutputCategory::Extracted)
            .join(format!("{stem}.bin"));

        let invocation =
            ToolInvocation::new(stem.clone(), OutputCategory::Steganography, build(&extracted))
                .probe(stem_tool);
        let report = self.run_tool(run, &invocation)?;

        if report.status == ToolStatus::Success && non_empty_file(&extracted) {
            run.workspace()
                .log()
                .info(format!("{stem} recovered data into {}", extracted.display()));
            return Ok(Some(PasswordOutcome::Recovered {
                attempt: stem,
                extracted,
            }));
        }
        Ok(None)
    }

    /// Drive the password state machine for one tool.
    pub fn run_password_flow(
        &self,
        run: &mut AnalysisRun,
        tool: PasswordTool,
        prompter: &mut dyn Prompter,
    ) -> Result<PasswordOutcome, StegError> {
        if !self.probe().is_available(tool.as_str()) {
            prompter.say(&format!("{tool} is not installed"));
            return Ok(PasswordOutcome::Unsupported);
        }

        let target = option_safe_path(run.input()).into_owned();
        let wordlist = option_safe_path(&self.config().defaults.wordlist).into_owned();
        let mut state = PasswordState::TryBlank;

        loop {
            state = match state {
                PasswordState::TryBlank => {
                    prompter.say(&format!("Trying {tool} with a blank password"));
                    match self.password_attempt(run, tool.as_str(), |out| {
                        tool.command(&target, out, "")
                    })? {
                        Some(outcome) => PasswordState::Done(outcome),
                        None => PasswordState::PromptLoop { attempts: 0 },
                    }
                }
                PasswordState::PromptLoop { attempts } if attempts >= MAX_MANUAL_ATTEMPTS => {
                    PasswordState::WordlistFallback
                }
                PasswordState::PromptLoop { attempts } => {
                    let prompt = format!(
                        "Password for {tool} ({}/{MAX_MANUAL_ATTEMPTS}, empty to stop): ",
                        attempts + 1
                    );
                    match prompter.read_secret(&prompt) {
                        Some(secret) if !secret.is_empty() => {
                            match self.password_attempt(run, tool.as_str(), |out| {
                                tool.command(&target, out, &secret)
                            })? {
                                Some(outcome) => PasswordState::Done(outcome),
                                None => {
                                    prompter.say("Password rejected");
                                    PasswordState::PromptLoop {
                                        attempts: attempts + 1,
                                    }
                                }
                            }
                        }
                        _ => PasswordState::WordlistFallback,
                    }
                }
                PasswordState::WordlistFallback => {
                    if tool != PasswordTool::Steghide
                        || !self.probe().is_available(WORDLIST_TOOL)
                        || !wordlist.is_file()
                    {
                        prompter.say("No wordlist attack available for this tool");
                        PasswordState::Done(PasswordOutcome::Unsupported)
                    } else {
                        prompter.say(&format!(
                            "Running {WORDLIST_TOOL} with {}",
                            wordlist.display()
                        ));
                        match self.password_attempt(run, WORDLIST_TOOL, |out| {
                            CommandSpec::new(WORDLIST_TOOL)
                                .arg(&target)
                                .arg(&wordlist)
                                .arg(out)
                        })? {
                            Some(outcome) => PasswordState::Done(outcome),
                            None => PasswordState::Done(PasswordOutcome::Exhausted),
                        }
                    }
                }
                PasswordState::Done(outcome) => {
                    match &outcome {
                        PasswordOutcome::Recovered { extracted, .. } => {
                            prompter.say(&format!("Data recovered: {}", extracted.display()));
                        }
                        PasswordOutcome::Exhausted => prompter.say("No password worked"),
                        PasswordOutcome::Unsupported => {}
                    }
                    return Ok(outcome);
                }
            };
        }
    }
}
