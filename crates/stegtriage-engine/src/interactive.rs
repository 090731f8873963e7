//! Interactive menu controller
//!
//! The controller is a small state machine. [`ControllerState::transition`] is
//! pure; [`Engine::interactive_session`] feeds it operator input and performs
//! the selected action between transitions.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use stegtriage_utils::error::{StegError, ValidationError};
use stegtriage_utils::types::PhaseId;

use crate::password::password_candidates;
use crate::phases::{InterruptDecision, InterruptPolicy};
use crate::prompt::Prompter;
use crate::run::{AnalysisRun, Engine};
use crate::summary;

/// Path prompts before interactive mode gives up.
pub const MAX_PATH_ATTEMPTS: u32 = 3;

pub const MENU_TEXT: &str = "\
Select an analysis:
  1) Basic analysis
  2) Metadata
  3) Carving
  4) Image analysis
  5) Audio/video analysis
  6) Advanced carving
  7) Run everything and show the summary
  8) Show the summary
  9) Try passwords for steghide/outguess
  0) Exit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    RunPhase(PhaseId),
    FullPipeline,
    ShowSummary,
    PasswordFlow,
    Exit,
}

impl MenuAction {
    /// Parse a menu selection. Surrounding whitespace is ignored.
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "0" => Some(Self::Exit),
            "7" => Some(Self::FullPipeline),
            "8" => Some(Self::ShowSummary),
            "9" => Some(Self::PasswordFlow),
            other => other
                .parse::<u8>()
                .ok()
                .and_then(PhaseId::from_number)
                .map(Self::RunPhase),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    Running(MenuAction),
    Exited,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerEvent {
    Input(String),
    Eof,
    ActionFinished,
}

impl ControllerState {
    #[must_use]
    pub fn transition(self, event: &ControllerEvent) -> Self {
        match (self, event) {
            (Self::Exited, _) => Self::Exited,
            (Self::Idle, ControllerEvent::Eof) => Self::Exited,
            (Self::Idle, ControllerEvent::Input(line)) => match MenuAction::parse(line) {
                Some(MenuAction::Exit) => Self::Exited,
                Some(action) => Self::Running(action),
                None => Self::Idle,
            },
            (Self::Running(_), ControllerEvent::ActionFinished) => Self::Idle,
            (state, _) => state,
        }
    }
}

/// Asks the operator what to do after Ctrl-C interrupts a tool.
struct AskOperator<'a> {
    prompter: &'a mut dyn Prompter,
}

impl InterruptPolicy for AskOperator<'_> {
    fn on_interrupt(&mut self, phase: PhaseId, tool: &str) -> InterruptDecision {
        loop {
            let answer = self.prompter.read_line(&format!(
                "{tool} was interrupted during {}. [c]ontinue, [r]estart phase, [q]uit? ",
                phase.title()
            ));
            match answer.as_deref().map(str::trim) {
                None => return InterruptDecision::Quit,
                Some("" | "c" | "C") => return InterruptDecision::Continue,
                Some("r" | "R") => return InterruptDecision::Restart,
                Some("q" | "Q") => return InterruptDecision::Quit,
                Some(_) => self.prompter.say("Please answer c, r or q"),
            }
        }
    }
}

impl Engine {
    /// Validate a path, re-prompting on validation failures.
    pub fn start_interactive_run(
        &self,
        initial: Option<&Path>,
        prompter: &mut dyn Prompter,
    ) -> Result<AnalysisRun, StegError> {
        let mut next = initial.map(Path::to_path_buf);
        let mut last_error: Option<ValidationError> = None;

        for _ in 0..MAX_PATH_ATTEMPTS {
            let path = match next.take() {
                Some(path) => path,
                None => match prompter.read_line("File to analyze: ") {
                    Some(line) => PathBuf::from(line.trim()),
                    None => break,
                },
            };

            match self.start_run(&path) {
                Ok(run) => return Ok(run),
                Err(StegError::Validation(e)) => {
                    prompter.say(&e.to_string());
                    last_error = Some(e);
                }
                Err(other) => return Err(other),
            }
        }

        Err(match last_error {
            Some(e) => StegError::Validation(e),
            None => StegError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "no input file given",
            )),
        })
    }

    fn show_summary(&self, run: &AnalysisRun, prompter: &mut dyn Prompter) {
        match fs::read_to_string(run.workspace().summary_path()) {
            Ok(text) => prompter.say(&text),
            Err(e) => prompter.say(&format!("Summary unavailable: {e}")),
        }
    }

    fn perform(
        &self,
        run: &mut AnalysisRun,
        action: MenuAction,
        prompter: &mut dyn Prompter,
    ) -> Result<(), StegError> {
        match action {
            MenuAction::RunPhase(phase) => {
                self.run_phase(run, phase, &mut AskOperator { prompter })?;
                self.report_tally(run);
            }
            MenuAction::FullPipeline => {
                self.analyze_file(run, &mut AskOperator { prompter: &mut *prompter })?;
                self.show_summary(run, prompter);
            }
            MenuAction::ShowSummary => {
                if !run.workspace().summary_path().is_file() {
                    summary::generate_summary(run);
                }
                self.show_summary(run, prompter);
            }
            MenuAction::PasswordFlow => {
                let candidates = password_candidates(run);
                if candidates.is_empty() {
                    prompter.say(
                        "No password-protected content reported yet; run the image or audio analysis first",
                    );
                }
                for tool in candidates {
                    self.run_password_flow(run, tool, prompter)?;
                }
            }
            MenuAction::Exit => {}
        }
        Ok(())
    }

    /// Menu loop over one file. Returns the run when the operator exits.
    ///
    /// Operator quit after an interrupt ends the session with
    /// [`StegError::Interrupted`]; other action errors are reported and the
    /// menu is shown again.
    pub fn interactive_session(
        &self,
        mut run: AnalysisRun,
        prompter: &mut dyn Prompter,
    ) -> Result<AnalysisRun, StegError> {
        let mut state = ControllerState::Idle;

        loop {
            state = match state {
                ControllerState::Exited => return Ok(run),
                ControllerState::Idle => {
                    prompter.say(MENU_TEXT);
                    let event = match prompter.read_line("Choice: ") {
                        Some(line) => ControllerEvent::Input(line),
                        None => ControllerEvent::Eof,
                    };
                    let next = state.transition(&event);
                    if next == ControllerState::Idle {
                        prompter.say("Unknown option");
                    }
                    next
                }
                ControllerState::Running(action) => {
                    match self.perform(&mut run, action, prompter) {
                        Ok(()) => {}
                        Err(StegError::Interrupted) => return Err(StegError::Interrupted),
                        Err(e) => {
                            run.workspace().log().error(e.to_string());
                            prompter.say(&format!("Action failed: {e}"));
                        }
                    }
                    state.transition(&ControllerEvent::ActionFinished)
                }
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ScriptedPrompter, ScriptedRunner, TestRig};
    use crate::workspace::OutputCategory;
    use stegtriage_utils::types::ContentCategory;

    #[test]
    fn test_menu_parsing() {
        assert_eq!(MenuAction::parse("1"), Some(MenuAction::RunPhase(PhaseId::Basic)));
        assert_eq!(
            MenuAction::parse(" 6 "),
            Some(MenuAction::RunPhase(PhaseId::AdvancedCarving))
        );
        assert_eq!(MenuAction::parse("7"), Some(MenuAction::FullPipeline));
        assert_eq!(MenuAction::parse("0"), Some(MenuAction::Exit));
        assert_eq!(MenuAction::parse("10"), None);
        assert_eq!(MenuAction::parse("x"), None);
    }

    #[test]
    fn test_transitions() {
        let idle = ControllerState::Idle;
        assert_eq!(
            idle.transition(&ControllerEvent::Input("2".into())),
            ControllerState::Running(MenuAction::RunPhase(PhaseId::Metadata))
        );
        assert_eq!(idle.transition(&ControllerEvent::Input("bogus".into())), idle);
        assert_eq!(idle.transition(&ControllerEvent::Input("0".into())), ControllerState::Exited);
        assert_eq!(idle.transition(&ControllerEvent::Eof), ControllerState::Exited);
        assert_eq!(idle.transition(&ControllerEvent::ActionFinished), idle);

        let running = ControllerState::Running(MenuAction::ShowSummary);
        assert_eq!(running.transition(&ControllerEvent::ActionFinished), idle);
        assert_eq!(running.transition(&ControllerEvent::Input("1".into())), running);
        assert_eq!(
            ControllerState::Exited.transition(&ControllerEvent::Input("1".into())),
            ControllerState::Exited
        );
    }

    #[test]
    fn test_session_runs_phase_then_exits() {
        let rig = TestRig::new(ContentCategory::Generic, &["exiftool"]);
        let run = rig.start_run();
        let root = run.workspace().root().to_path_buf();

        let mut prompter = ScriptedPrompter::new(&["2", "nonsense", "8", "0"]);
        let run = rig.engine.interactive_session(run, &mut prompter).unwrap();

        assert_eq!(run.workspace().root(), root);
        assert!(run
            .workspace()
            .artifact_path(OutputCategory::Metadata, "exiftool")
            .is_file());
        assert!(run.workspace().summary_path().is_file());
        assert!(prompter.transcript().iter().any(|line| line == "Unknown option"));
        assert_eq!(rig.runner.calls().len(), 1);
    }

    #[test]
    fn test_session_ends_on_eof() {
        let rig = TestRig::new(ContentCategory::Generic, &[]);
        let run = rig.start_run();
        let mut prompter = ScriptedPrompter::new(&[]);
        assert!(rig.engine.interactive_session(run, &mut prompter).is_ok());
    }

    #[test]
    fn test_interrupt_quit_ends_session() {
        let rig = TestRig::new(ContentCategory::Generic, &["exiftool"]);
        rig.runner.script("exiftool", ScriptedRunner::interrupted());
        let run = rig.start_run();

        let mut prompter = ScriptedPrompter::new(&["2", "q"]);
        let err = rig.engine.interactive_session(run, &mut prompter).unwrap_err();
        assert!(matches!(err, StegError::Interrupted));
    }

    #[test]
    fn test_path_reprompt_limit() {
        let rig = TestRig::new(ContentCategory::Generic, &[]);
        let missing = rig.output_root().join("missing.bin");
        let mut prompter = ScriptedPrompter::new(&["also-missing", "still-missing"]);

        let err = rig
            .engine
            .start_interactive_run(Some(&missing), &mut prompter)
            .unwrap_err();
        assert!(matches!(err, StegError::Validation(_)));
        assert_eq!(prompter.remaining(), 0);

        let good = rig.input().to_path_buf();
        let mut prompter = ScriptedPrompter::new(&[good.to_str().unwrap()]);
        let run = rig
            .engine
            .start_interactive_run(Some(&rig.output_root().join("nope")), &mut prompter)
            .unwrap();
        assert_eq!(run.input(), good);
    }
}
