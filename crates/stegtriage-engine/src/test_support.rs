//! Fakes for exercising the engine without forensic tools installed.
//!
//! Compiled for this crate's tests and for dependents enabling `test-utils`.

#![allow(clippy::missing_panics_doc)]

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tempfile::TempDir;

use stegtriage_config::Config;
use stegtriage_runner::{CommandSpec, ProcessOutput, ProcessRunner, RunnerError};
use stegtriage_utils::types::{ContentCategory, ExitOnePolicy, ImageFormat};

use crate::filetype::FileTypeProbe;
use crate::prompt::Prompter;
use crate::registry::ToolProbe;
use crate::run::{AnalysisRun, Engine};

// ============================================================================
// Probes
// ============================================================================

/// Tool probe with a fixed answer set. `None` means every tool is present.
#[derive(Debug, Clone, Default)]
pub struct StaticProbe {
    tools: Option<BTreeSet<String>>,
}

impl StaticProbe {
    #[must_use]
    pub fn none() -> Self {
        Self {
            tools: Some(BTreeSet::new()),
        }
    }

    #[must_use]
    pub fn all() -> Self {
        Self { tools: None }
    }

    #[must_use]
    pub fn with(tools: &[&str]) -> Self {
        Self {
            tools: Some(tools.iter().map(|t| (*t).to_string()).collect()),
        }
    }
}

impl ToolProbe for StaticProbe {
    fn is_available(&self, tool: &str) -> bool {
        self.tools.as_ref().is_none_or(|set| set.contains(tool))
    }
}

/// File-type probe returning the same answer for every path.
#[derive(Debug, Clone, Default)]
pub struct FixedFileTypes {
    mime: Option<String>,
    description: Option<String>,
}

impl FixedFileTypes {
    #[must_use]
    pub fn new(mime: &str, description: &str) -> Self {
        Self {
            mime: Some(mime.to_string()),
            description: Some(description.to_string()),
        }
    }

    /// Probe that never knows the answer.
    #[must_use]
    pub fn unknown() -> Self {
        Self::default()
    }
}

impl FileTypeProbe for FixedFileTypes {
    fn mime_type(&self, _path: &Path) -> Option<String> {
        self.mime.clone()
    }

    fn describe(&self, _path: &Path) -> Option<String> {
        self.description.clone()
    }
}

// ============================================================================
// ScriptedRunner
// ============================================================================

#[derive(Debug, Clone)]
enum OutcomeKind {
    Exit(i32),
    Timeout,
    Interrupted,
    SpawnFailure,
}

/// One canned process result.
#[derive(Debug, Clone)]
pub struct ScriptedOutcome {
    kind: OutcomeKind,
    output: String,
    creates: Vec<(PathBuf, Vec<u8>)>,
}

impl ScriptedOutcome {
    /// Also write `bytes` to `path`, as a tool extracting data would.
    #[must_use]
    pub fn creating(mut self, path: &Path, bytes: &[u8]) -> Self {
        self.creates.push((path.to_path_buf(), bytes.to_vec()));
        self
    }
}

#[derive(Debug, Default)]
struct ScriptState {
    outcomes: HashMap<String, VecDeque<ScriptedOutcome>>,
    calls: Vec<String>,
}

/// Process runner replaying scripted outcomes per program.
///
/// Outcomes queued for a program are consumed in order; the last one repeats.
/// Unscripted programs exit 0 with no output. Clones share their script.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRunner {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedRunner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn output(exit_code: i32, text: &str) -> ScriptedOutcome {
        ScriptedOutcome {
            kind: OutcomeKind::Exit(exit_code),
            output: text.to_string(),
            creates: Vec::new(),
        }
    }

    #[must_use]
    pub fn timeout(partial: &str) -> ScriptedOutcome {
        ScriptedOutcome {
            kind: OutcomeKind::Timeout,
            output: partial.to_string(),
            creates: Vec::new(),
        }
    }

    #[must_use]
    pub fn interrupted() -> ScriptedOutcome {
        ScriptedOutcome {
            kind: OutcomeKind::Interrupted,
            output: String::new(),
            creates: Vec::new(),
        }
    }

    #[must_use]
    pub fn spawn_failure() -> ScriptedOutcome {
        ScriptedOutcome {
            kind: OutcomeKind::SpawnFailure,
            output: String::new(),
            creates: Vec::new(),
        }
    }

    /// Queue an outcome for `program`.
    pub fn script(&self, program: &str, outcome: ScriptedOutcome) {
        let mut state = self.state.lock().unwrap();
        state
            .outcomes
            .entry(program.to_string())
            .or_default()
            .push_back(outcome);
    }

    /// Display strings of every command run so far.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    fn next_outcome(&self, program: &str) -> ScriptedOutcome {
        let mut state = self.state.lock().unwrap();
        match state.outcomes.get_mut(program) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) if !queue.is_empty() => queue[0].clone(),
            _ => Self::output(0, ""),
        }
    }
}

impl ProcessRunner for ScriptedRunner {
    fn run(
        &self,
        cmd: &CommandSpec,
        mut sink: File,
        _budget: Duration,
    ) -> Result<ProcessOutput, RunnerError> {
        let program = cmd.program_name();
        self.state.lock().unwrap().calls.push(cmd.display());
        let outcome = self.next_outcome(&program);

        if let OutcomeKind::SpawnFailure = outcome.kind {
            return Err(RunnerError::SpawnFailed {
                program,
                reason: "scripted spawn failure".to_string(),
            });
        }

        sink.write_all(outcome.output.as_bytes())
            .map_err(|e| RunnerError::OutputSink {
                reason: e.to_string(),
            })?;
        for (path, bytes) in &outcome.creates {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(path, bytes).unwrap();
        }

        let elapsed = Duration::from_millis(10);
        Ok(match outcome.kind {
            OutcomeKind::Exit(code) => ProcessOutput::exited(Some(code), elapsed),
            OutcomeKind::Timeout => ProcessOutput::timed_out(None, elapsed),
            OutcomeKind::Interrupted => ProcessOutput::interrupted(None, elapsed),
            OutcomeKind::SpawnFailure => unreachable!(),
        })
    }
}

// ============================================================================
// ScriptedPrompter
// ============================================================================

/// Prompter answering from a fixed list; `None` once the list is exhausted.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPrompter {
    inputs: VecDeque<String>,
    transcript: Vec<String>,
}

impl ScriptedPrompter {
    #[must_use]
    pub fn new(inputs: &[&str]) -> Self {
        Self {
            inputs: inputs.iter().map(|s| (*s).to_string()).collect(),
            transcript: Vec::new(),
        }
    }

    /// Inputs not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.inputs.len()
    }

    /// Prompts shown and messages said, in order.
    #[must_use]
    pub fn transcript(&self) -> &[String] {
        &self.transcript
    }
}

impl Prompter for ScriptedPrompter {
    fn read_line(&mut self, prompt: &str) -> Option<String> {
        self.transcript.push(prompt.to_string());
        self.inputs.pop_front()
    }

    fn read_secret(&mut self, prompt: &str) -> Option<String> {
        self.read_line(prompt)
    }

    fn say(&mut self, message: &str) {
        self.transcript.push(message.to_string());
    }
}

// ============================================================================
// TestRig
// ============================================================================

fn fixture_for(category: ContentCategory) -> (&'static str, &'static str, &'static str) {
    match category {
        ContentCategory::Image(ImageFormat::Png) => ("sample.png", "image/png", "PNG image data"),
        ContentCategory::Image(ImageFormat::Jpeg) => {
            ("sample.jpg", "image/jpeg", "JPEG image data, JFIF standard 1.01")
        }
        ContentCategory::Image(ImageFormat::Gif) => ("sample.gif", "image/gif", "GIF image data"),
        ContentCategory::Image(ImageFormat::Bmp) => {
            ("sample.bmp", "image/bmp", "PC bitmap, Windows 3.x format")
        }
        ContentCategory::Image(ImageFormat::Other) => ("sample.tif", "image/tiff", "TIFF image data"),
        ContentCategory::Audio => ("sample.wav", "audio/x-wav", "RIFF (little-endian) data, WAVE audio"),
        ContentCategory::Video => ("sample.mp4", "video/mp4", "ISO Media, MP4 v2"),
        ContentCategory::Generic => ("sample.bin", "application/octet-stream", "data"),
    }
}

/// A temp directory with one evidence file, an output root and an engine
/// wired to fakes.
pub struct TestRig {
    dir: TempDir,
    input: PathBuf,
    config: Config,
    tools: Vec<String>,
    file_types: FixedFileTypes,
    pub runner: ScriptedRunner,
    pub engine: Engine,
}

impl TestRig {
    #[must_use]
    pub fn new(category: ContentCategory, tools: &[&str]) -> Self {
        let dir = TempDir::new().unwrap();
        let (file_name, mime, description) = fixture_for(category);

        let evidence = dir.path().join("evidence");
        fs::create_dir_all(&evidence).unwrap();
        let input = evidence.join(file_name);
        fs::write(&input, b"\x89stegtriage fixture payload\n").unwrap();

        let mut config = Config::default();
        config.defaults.output_dir = dir.path().join("outputs");
        config.defaults.wordlist = dir.path().join("no-wordlist.txt");

        let tools: Vec<String> = tools.iter().map(|t| (*t).to_string()).collect();
        let file_types = FixedFileTypes::new(mime, description);
        let runner = ScriptedRunner::new();
        let engine = Self::build_engine(&config, &tools, &file_types, &runner);

        Self {
            dir,
            input,
            config,
            tools,
            file_types,
            runner,
            engine,
        }
    }

    fn build_engine(
        config: &Config,
        tools: &[String],
        file_types: &FixedFileTypes,
        runner: &ScriptedRunner,
    ) -> Engine {
        let names: Vec<&str> = tools.iter().map(String::as_str).collect();
        Engine::new(
            config.clone(),
            Box::new(StaticProbe::with(&names)),
            Box::new(file_types.clone()),
            Box::new(runner.clone()),
        )
        .with_console(false)
    }

    fn rebuild(&mut self) {
        self.engine = Self::build_engine(&self.config, &self.tools, &self.file_types, &self.runner);
    }

    /// Override the exit-code-1 policy of one tool.
    pub fn set_tool_policy(&mut self, tool: &str, policy: ExitOnePolicy) {
        self.config
            .tools
            .entry(tool.to_string())
            .or_default()
            .exit_code_one = Some(policy);
        self.rebuild();
    }

    /// Override the time budget of one tool, in seconds.
    pub fn set_tool_timeout(&mut self, tool: &str, secs: u64) {
        self.config.tools.entry(tool.to_string()).or_default().timeout = Some(secs);
        self.rebuild();
    }

    /// Create a small wordlist and point the configuration at it.
    #[must_use]
    pub fn with_wordlist(mut self) -> Self {
        let path = self.dir.path().join("wordlist.txt");
        fs::write(&path, "password\nhunter2\nletmein\n").unwrap();
        self.config.defaults.wordlist = path;
        self.rebuild();
        self
    }

    #[must_use]
    pub fn input(&self) -> &Path {
        &self.input
    }

    /// Another evidence file next to the default input.
    #[must_use]
    pub fn sibling_input(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.input.with_file_name(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[must_use]
    pub fn output_root(&self) -> &Path {
        &self.config.defaults.output_dir
    }

    /// Start a run over the default input.
    #[must_use]
    pub fn start_run(&self) -> AnalysisRun {
        self.engine.start_run(&self.input).unwrap()
    }
}
