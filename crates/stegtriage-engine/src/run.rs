//! Analysis runs and the engine that drives them

use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use stegtriage_config::Config;
use stegtriage_runner::{InterruptFlag, NativeRunner, ProcessRunner};
use stegtriage_utils::error::{StegError, ValidationError};
use stegtriage_utils::logging;
use stegtriage_utils::types::{ContentCategory, PhaseId, ToolStatus};

use crate::filetype::{FileCommandProbe, FileTypeProbe, probe_mime};
use crate::phases::InterruptPolicy;
use crate::registry::{DependencyReport, PathProbe, ToolProbe, check_dependencies};
use crate::summary::{self, SummaryFindings};
use crate::validation::{ValidationPolicy, validate_input};
use crate::workspace::OutputWorkspace;

/// Per-run tallies. Only ever incremented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounters {
    successes: u32,
    warnings: u32,
    errors: u32,
    timeouts: u32,
    skipped: u32,
    interrupted: u32,
}

impl RunCounters {
    pub(crate) fn record(&mut self, status: ToolStatus) {
        let slot = match status {
            ToolStatus::Success => &mut self.successes,
            ToolStatus::Warning => &mut self.warnings,
            ToolStatus::Error => &mut self.errors,
            ToolStatus::Timeout => &mut self.timeouts,
            ToolStatus::SkippedUnavailable => &mut self.skipped,
            ToolStatus::Interrupted => &mut self.interrupted,
        };
        *slot = slot.saturating_add(1);
    }

    #[must_use]
    pub const fn successes(&self) -> u32 {
        self.successes
    }

    #[must_use]
    pub const fn warnings(&self) -> u32 {
        self.warnings
    }

    #[must_use]
    pub const fn errors(&self) -> u32 {
        self.errors
    }

    #[must_use]
    pub const fn timeouts(&self) -> u32 {
        self.timeouts
    }

    #[must_use]
    pub const fn skipped(&self) -> u32 {
        self.skipped
    }

    #[must_use]
    pub const fn interrupted(&self) -> u32 {
        self.interrupted
    }

    /// Number of invocations recorded.
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.successes + self.warnings + self.errors + self.timeouts + self.skipped + self.interrupted
    }
}

/// One analysis of one input file.
#[derive(Debug)]
pub struct AnalysisRun {
    input: PathBuf,
    mime: String,
    category: ContentCategory,
    workspace: OutputWorkspace,
    started_at: DateTime<Local>,
    dependencies: DependencyReport,
    counters: RunCounters,
}

impl AnalysisRun {
    #[must_use]
    pub fn input(&self) -> &Path {
        &self.input
    }

    #[must_use]
    pub fn mime(&self) -> &str {
        &self.mime
    }

    #[must_use]
    pub fn category(&self) -> ContentCategory {
        self.category
    }

    #[must_use]
    pub fn workspace(&self) -> &OutputWorkspace {
        &self.workspace
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    #[must_use]
    pub fn dependencies(&self) -> &DependencyReport {
        &self.dependencies
    }

    #[must_use]
    pub fn counters(&self) -> &RunCounters {
        &self.counters
    }

    pub(crate) fn counters_mut(&mut self) -> &mut RunCounters {
        &mut self.counters
    }
}

/// Drives analysis runs.
///
/// Tool probing, MIME probing and process execution are trait objects so
/// tests can run the whole pipeline without any forensic tool installed.
pub struct Engine {
    config: Config,
    probe: Box<dyn ToolProbe>,
    file_types: Box<dyn FileTypeProbe>,
    runner: Box<dyn ProcessRunner>,
    progress: bool,
    console: bool,
}

impl Engine {
    #[must_use]
    pub fn new(
        config: Config,
        probe: Box<dyn ToolProbe>,
        file_types: Box<dyn FileTypeProbe>,
        runner: Box<dyn ProcessRunner>,
    ) -> Self {
        Self {
            config,
            probe,
            file_types,
            runner,
            progress: false,
            console: true,
        }
    }

    /// Engine backed by `PATH`, the `file` utility and native processes.
    #[must_use]
    pub fn native(config: Config, interrupts: Option<Arc<InterruptFlag>>) -> Self {
        let mut runner = NativeRunner::new(config.kill_grace());
        if let Some(flag) = interrupts {
            runner = runner.with_interrupts(flag);
        }
        Self::new(
            config,
            Box::new(PathProbe),
            Box::new(FileCommandProbe),
            Box::new(runner),
        )
    }

    /// Show a spinner while tools run.
    #[must_use]
    pub fn with_progress(mut self, enabled: bool) -> Self {
        self.progress = enabled;
        self
    }

    /// Print per-tool status lines and tallies to stdout.
    #[must_use]
    pub fn with_console(mut self, enabled: bool) -> Self {
        self.console = enabled;
        self
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub(crate) fn probe(&self) -> &dyn ToolProbe {
        self.probe.as_ref()
    }

    pub(crate) fn runner(&self) -> &dyn ProcessRunner {
        self.runner.as_ref()
    }

    pub(crate) fn progress(&self) -> bool {
        self.progress
    }

    pub(crate) fn console(&self) -> bool {
        self.console
    }

    fn validation_policy(&self) -> ValidationPolicy {
        ValidationPolicy {
            level: self.config.defaults.security_level,
            max_file_size: self.config.defaults.max_file_size,
        }
    }

    /// Validate `input` at the configured security level.
    pub fn validate(&self, input: &Path) -> Result<(), ValidationError> {
        validate_input(input, self.validation_policy(), self.file_types.as_ref())
    }

    #[must_use]
    pub fn check_dependencies(&self) -> DependencyReport {
        check_dependencies(self.probe.as_ref())
    }

    /// Validate the input, create its workspace and probe its content type.
    ///
    /// Nothing is written when validation fails.
    pub fn start_run(&self, input: &Path) -> Result<AnalysisRun, StegError> {
        self.validate(input)?;

        let dependencies = self.check_dependencies();
        let started_at = Local::now();
        let workspace = OutputWorkspace::create(
            &self.config.defaults.output_dir,
            input,
            &started_at,
            &dependencies,
        )?;

        let mime = probe_mime(self.file_types.as_ref(), input);
        let category = ContentCategory::from_mime(&mime);

        let log = workspace.log();
        log.info(format!("Starting analysis of {}", input.display()));
        log.info(format!("Workspace: {}", workspace.root().display()));
        log.info(format!("MIME type: {mime} (category: {category})"));
        log.debug(format!(
            "Security level: {}",
            self.config.defaults.security_level
        ));
        for tool in &dependencies.missing_required {
            log.warn(format!("Required tool not installed: {tool}"));
        }
        if let Err(e) = workspace.write_missing_tools(&dependencies) {
            log.error(e.to_string());
        }

        Ok(AnalysisRun {
            input: input.to_path_buf(),
            mime,
            category,
            workspace,
            started_at,
            dependencies,
            counters: RunCounters::default(),
        })
    }

    /// Run all six phases in order, then write the summary.
    pub fn analyze_file(
        &self,
        run: &mut AnalysisRun,
        interrupts: &mut dyn InterruptPolicy,
    ) -> Result<SummaryFindings, StegError> {
        for phase in PhaseId::ALL {
            self.run_phase(run, phase, interrupts)?;
        }

        let findings = summary::generate_summary(run);
        self.report_tally(run);
        Ok(findings)
    }

    /// [`start_run`](Self::start_run) followed by [`analyze_file`](Self::analyze_file).
    pub fn analyze(
        &self,
        input: &Path,
        interrupts: &mut dyn InterruptPolicy,
    ) -> Result<AnalysisRun, StegError> {
        let mut run = self.start_run(input)?;
        self.analyze_file(&mut run, interrupts)?;
        Ok(run)
    }

    pub(crate) fn report_tally(&self, run: &AnalysisRun) {
        let counters = run.counters();
        run.workspace().log().info(format!(
            "Run tally: {} succeeded, {} warning(s), {} error(s), {} timeout(s), {} skipped",
            counters.successes(),
            counters.warnings(),
            counters.errors(),
            counters.timeouts(),
            counters.skipped()
        ));
        if self.console {
            logging::print_run_tally(
                &run.input().display().to_string(),
                counters.errors(),
                counters.warnings(),
                counters.timeouts(),
                counters.skipped(),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestRig;
    use stegtriage_utils::types::ImageFormat;

    #[test]
    fn test_counters_are_per_status() {
        let mut counters = RunCounters::default();
        for status in [
            ToolStatus::Success,
            ToolStatus::Warning,
            ToolStatus::Warning,
            ToolStatus::Timeout,
            ToolStatus::Error,
            ToolStatus::SkippedUnavailable,
        ] {
            counters.record(status);
        }
        assert_eq!(counters.successes(), 1);
        assert_eq!(counters.warnings(), 2);
        assert_eq!(counters.timeouts(), 1);
        assert_eq!(counters.errors(), 1);
        assert_eq!(counters.skipped(), 1);
        assert_eq!(counters.total(), 6);
    }

    #[test]
    fn test_start_run_probes_category_once() {
        let rig = TestRig::new(ContentCategory::Image(ImageFormat::Png), &["file"]);
        let run = rig.start_run();

        assert_eq!(run.mime(), "image/png");
        assert_eq!(run.category(), ContentCategory::Image(ImageFormat::Png));
        assert!(run.workspace().root().starts_with(rig.output_root()));
        assert!(run
            .workspace()
            .dir(crate::workspace::OutputCategory::Logs)
            .join(crate::workspace::MISSING_TOOLS_FILE_NAME)
            .is_file());
    }

    #[test]
    fn test_validation_failure_creates_nothing() {
        let rig = TestRig::new(ContentCategory::Generic, &[]);
        let err = rig
            .engine
            .start_run(&rig.output_root().join("does-not-exist.bin"))
            .unwrap_err();

        assert!(matches!(err, StegError::Validation(_)));
        assert!(crate::workspace::list_files(rig.output_root()).is_empty());
    }
}
