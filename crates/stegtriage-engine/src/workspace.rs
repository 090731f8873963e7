//! Output workspace
//!
//! One directory per analysed file:
//!
//! ```text
//! <root>/<sanitised-name>_<YYYYMMDD_HHMMSS>/
//!   analysis_log.txt
//!   analysis_summary.txt
//!   Basic Analysis/  Metadata/[Advanced/]  Steganography/[Advanced/]
//!   Image Analysis/  Audio Analysis/  Video Analysis/  Extracted/  Logs/
//! ```

use chrono::{DateTime, Local};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use stegtriage_utils::error::WorkspaceError;
use stegtriage_utils::paths::{option_safe_path, workspace_dir_name};

use crate::registry::DependencyReport;

pub const LOG_FILE_NAME: &str = "analysis_log.txt";
pub const SUMMARY_FILE_NAME: &str = "analysis_summary.txt";
pub const MISSING_TOOLS_FILE_NAME: &str = "missing_tools.txt";
pub const SKIPPED_TOOLS_FILE_NAME: &str = "skipped_tools.txt";

/// Suffix shared by every tool transcript.
pub const ARTIFACT_SUFFIX: &str = "_output.txt";

/// Category subdirectory of a workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputCategory {
    BasicAnalysis,
    Metadata,
    MetadataAdvanced,
    Steganography,
    SteganographyAdvanced,
    ImageAnalysis,
    AudioAnalysis,
    VideoAnalysis,
    Extracted,
    Logs,
}

impl OutputCategory {
    /// Created with every workspace.
    pub const EAGER: [OutputCategory; 8] = [
        Self::BasicAnalysis,
        Self::Metadata,
        Self::Steganography,
        Self::ImageAnalysis,
        Self::AudioAnalysis,
        Self::VideoAnalysis,
        Self::Extracted,
        Self::Logs,
    ];

    /// Path relative to the workspace root.
    #[must_use]
    pub const fn rel_path(&self) -> &'static str {
        match self {
            Self::BasicAnalysis => "Basic Analysis",
            Self::Metadata => "Metadata",
            Self::MetadataAdvanced => "Metadata/Advanced",
            Self::Steganography => "Steganography",
            Self::SteganographyAdvanced => "Steganography/Advanced",
            Self::ImageAnalysis => "Image Analysis",
            Self::AudioAnalysis => "Audio Analysis",
            Self::VideoAnalysis => "Video Analysis",
            Self::Extracted => "Extracted",
            Self::Logs => "Logs",
        }
    }
}

impl std::fmt::Display for OutputCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.rel_path())
    }
}

/// Severity of a run log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }
}

/// Persistent per-run log (`analysis_log.txt`).
///
/// Each line is `[YYYY-MM-DD HH:MM:SS] [LEVEL] message` and is also emitted
/// through `tracing` at the matching level.
#[derive(Debug, Clone)]
pub struct RunLog {
    path: PathBuf,
}

impl RunLog {
    fn new(path: PathBuf) -> Self {
        Self { path }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn debug(&self, message: impl AsRef<str>) {
        self.write(LogLevel::Debug, message.as_ref());
    }

    pub fn info(&self, message: impl AsRef<str>) {
        self.write(LogLevel::Info, message.as_ref());
    }

    pub fn warn(&self, message: impl AsRef<str>) {
        self.write(LogLevel::Warn, message.as_ref());
    }

    pub fn error(&self, message: impl AsRef<str>) {
        self.write(LogLevel::Error, message.as_ref());
    }

    fn write(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Debug => tracing::debug!("{message}"),
            LogLevel::Info => tracing::info!("{message}"),
            LogLevel::Warn => tracing::warn!("{message}"),
            LogLevel::Error => tracing::error!("{message}"),
        }

        let line = format!(
            "[{}] [{}] {message}\n",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            level.as_str()
        );

        // A log write failure must not turn into a run failure
        if let Err(e) = append_to(&self.path, &line) {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to append to run log");
        }
    }
}

fn append_to(path: &Path, text: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(text.as_bytes())
}

/// The directory tree owned by one analysis run.
#[derive(Debug, Clone)]
pub struct OutputWorkspace {
    root: PathBuf,
    log: RunLog,
}

impl OutputWorkspace {
    /// Create `<output_root>/<sanitised-name>_<timestamp>/` and its category
    /// subdirectories. Advanced subdirectories follow the dependency report.
    pub fn create(
        output_root: &Path,
        input: &Path,
        started_at: &DateTime<Local>,
        dependencies: &DependencyReport,
    ) -> Result<Self, WorkspaceError> {
        // Every tool output path derives from the root
        let root = option_safe_path(output_root).join(workspace_dir_name(input, started_at)?);

        let mut categories = OutputCategory::EAGER.to_vec();
        if dependencies.advanced_metadata {
            categories.push(OutputCategory::MetadataAdvanced);
        }
        if dependencies.advanced_stego {
            categories.push(OutputCategory::SteganographyAdvanced);
        }

        for category in categories {
            create_dir(&root.join(category.rel_path()))?;
        }

        let workspace = Self {
            log: RunLog::new(root.join(LOG_FILE_NAME)),
            root,
        };

        File::options()
            .create(true)
            .append(true)
            .open(workspace.log.path())
            .map_err(|e| WorkspaceError::WriteFile {
                path: workspace.log.path().to_path_buf(),
                reason: e.to_string(),
            })?;

        Ok(workspace)
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn log(&self) -> &RunLog {
        &self.log
    }

    #[must_use]
    pub fn dir(&self, category: OutputCategory) -> PathBuf {
        self.root.join(category.rel_path())
    }

    /// `{workspace}/{category}/{name}_output.txt`
    #[must_use]
    pub fn artifact_path(&self, category: OutputCategory, name: &str) -> PathBuf {
        self.dir(category).join(format!("{name}{ARTIFACT_SUFFIX}"))
    }

    #[must_use]
    pub fn summary_path(&self) -> PathBuf {
        self.root.join(SUMMARY_FILE_NAME)
    }

    /// Append a line to `Logs/skipped_tools.txt`.
    pub fn record_skip(&self, tool: &str, reason: &str) -> Result<(), WorkspaceError> {
        let path = self.dir(OutputCategory::Logs).join(SKIPPED_TOOLS_FILE_NAME);
        let line = format!(
            "[{}] {tool}: {reason}\n",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        append_to(&path, &line).map_err(|e| WorkspaceError::WriteFile {
            path,
            reason: e.to_string(),
        })
    }

    /// Write `Logs/missing_tools.txt`.
    pub fn write_missing_tools(&self, report: &DependencyReport) -> Result<(), WorkspaceError> {
        let path = self.dir(OutputCategory::Logs).join(MISSING_TOOLS_FILE_NAME);
        fs::write(&path, report.render_text()).map_err(|e| WorkspaceError::WriteFile {
            path,
            reason: e.to_string(),
        })
    }

    /// Append text to the summary artifact.
    pub fn append_summary(&self, text: &str) -> Result<(), WorkspaceError> {
        let path = self.summary_path();
        append_to(&path, text).map_err(|e| WorkspaceError::WriteFile {
            path,
            reason: e.to_string(),
        })
    }

    /// Lowest attempt number with neither a transcript nor an extraction file.
    #[must_use]
    pub fn next_attempt_index(&self, tool: &str) -> u32 {
        (1..)
            .find(|index| {
                let stem = attempt_stem(tool, *index);
                !self
                    .artifact_path(OutputCategory::Steganography, &stem)
                    .exists()
                    && !self
                        .dir(OutputCategory::Extracted)
                        .join(format!("{stem}.bin"))
                        .exists()
            })
            .unwrap_or(1)
    }
}

/// `<tool>_attempt_<NN>`
#[must_use]
pub fn attempt_stem(tool: &str, index: u32) -> String {
    format!("{tool}_attempt_{index:02}")
}

fn create_dir(path: &Path) -> Result<(), WorkspaceError> {
    fs::create_dir_all(path).map_err(|e| WorkspaceError::CreateDir {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Regular files under `dir`, recursively. Unreadable entries are skipped.
#[must_use]
pub fn list_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];

    while let Some(current) = pending.pop() {
        let Ok(entries) = fs::read_dir(&current) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            match entry.file_type() {
                Ok(kind) if kind.is_dir() => pending.push(path),
                Ok(kind) if kind.is_file() => files.push(path),
                _ => {}
            }
        }
    }

    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn started() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 5, 1, 12, 30, 45).unwrap()
    }

    #[test]
    fn test_create_builds_eager_tree() {
        let temp = TempDir::new().unwrap();
        let ws = OutputWorkspace::create(
            temp.path(),
            Path::new("/cases/cover photo.png"),
            &started(),
            &DependencyReport::default(),
        )
        .unwrap();

        assert_eq!(ws.root(), temp.path().join("cover_photo.png_20240501_123045"));
        for category in OutputCategory::EAGER {
            assert!(ws.dir(category).is_dir(), "{category} missing");
        }
        assert!(!ws.dir(OutputCategory::MetadataAdvanced).exists());
        assert!(!ws.dir(OutputCategory::SteganographyAdvanced).exists());
        assert!(ws.log().path().is_file());
    }

    #[test]
    fn test_advanced_dirs_follow_report() {
        let temp = TempDir::new().unwrap();
        let report = DependencyReport {
            advanced_metadata: true,
            advanced_stego: true,
            ..DependencyReport::default()
        };
        let ws = OutputWorkspace::create(temp.path(), Path::new("a.jpg"), &started(), &report)
            .unwrap();

        assert!(ws.dir(OutputCategory::MetadataAdvanced).is_dir());
        assert!(ws.dir(OutputCategory::SteganographyAdvanced).is_dir());
    }

    #[test]
    fn test_artifact_path_is_deterministic() {
        let temp = TempDir::new().unwrap();
        let ws = OutputWorkspace::create(
            temp.path(),
            Path::new("a.jpg"),
            &started(),
            &DependencyReport::default(),
        )
        .unwrap();

        let path = ws.artifact_path(OutputCategory::Metadata, "exiftool");
        assert_eq!(path, ws.root().join("Metadata").join("exiftool_output.txt"));
        assert_eq!(path, ws.artifact_path(OutputCategory::Metadata, "exiftool"));
    }

    #[test]
    fn test_run_log_line_format() {
        let temp = TempDir::new().unwrap();
        let ws = OutputWorkspace::create(
            temp.path(),
            Path::new("a.jpg"),
            &started(),
            &DependencyReport::default(),
        )
        .unwrap();

        ws.log().info("Starting analysis");
        ws.log().error("binwalk failed");

        let text = fs::read_to_string(ws.log().path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with('['));
        assert!(lines[0].ends_with("] [INFO] Starting analysis"));
        assert!(lines[1].ends_with("] [ERROR] binwalk failed"));
    }

    #[test]
    fn test_next_attempt_index_skips_used_numbers() {
        let temp = TempDir::new().unwrap();
        let ws = OutputWorkspace::create(
            temp.path(),
            Path::new("a.jpg"),
            &started(),
            &DependencyReport::default(),
        )
        .unwrap();

        assert_eq!(ws.next_attempt_index("steghide"), 1);
        fs::write(ws.artifact_path(OutputCategory::Steganography, "steghide_attempt_01"), "x")
            .unwrap();
        fs::write(ws.dir(OutputCategory::Extracted).join("steghide_attempt_02.bin"), "x").unwrap();
        assert_eq!(ws.next_attempt_index("steghide"), 3);
        assert_eq!(ws.next_attempt_index("outguess"), 1);
    }

    #[test]
    fn test_list_files_recurses() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("a/b")).unwrap();
        fs::write(temp.path().join("top.txt"), "1").unwrap();
        fs::write(temp.path().join("a/b/deep.bin"), "2").unwrap();

        let files = list_files(temp.path());
        assert_eq!(files.len(), 2);
        assert!(list_files(&temp.path().join("missing")).is_empty());
    }
}
