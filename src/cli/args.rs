//! CLI argument definitions (clap)

use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;

use stegtriage_utils::types::SecurityLevel;

/// stegtriage - forensic triage for suspected steganography
#[derive(Parser, Debug)]
#[command(name = "stegtriage")]
#[command(about = "Run stego, carving and metadata tools against a file and collect the results")]
#[command(long_about = r#"
stegtriage runs a fixed set of forensic tools against a file in six phases
and stores every transcript in a timestamped workspace. It reports what the
tools said; it never decides whether data is hidden.

EXAMPLES:
  # Full analysis of one file
  stegtriage suspicious.png

  # Several files, one workspace each
  stegtriage -b evidence/*.jpg

  # Menu-driven analysis
  stegtriage -i capture.wav

  # Reject scripts and executables before analysis
  stegtriage -s paranoid upload.bin

  # Which tools are installed?
  stegtriage --check-deps --json

PHASES:
  1 Basic → 2 Metadata → 3 Carving → 4 Image → 5 Audio/Video → 6 Advanced carving
  Phases 4 and 5 only apply to matching content; missing tools are skipped.

CONFIGURATION:
  Precedence: CLI flags > STEGTRIAGE_OUTPUT_DIR > config file > defaults
  The config file is discovered by searching upward from CWD for
  .stegtriage/config.toml; use --config to name one explicitly.
"#)]
#[command(version)]
pub struct Cli {
    /// Menu-driven analysis of a single file
    #[arg(short = 'i', long, conflicts_with = "batch")]
    pub interactive: bool,

    /// Analyse every FILE in turn (implied by more than one FILE)
    #[arg(short = 'b', long)]
    pub batch: bool,

    /// Input validation level: minimal, normal or paranoid
    #[arg(short = 's', long = "security", value_name = "LEVEL")]
    pub security: Option<SecurityLevel>,

    /// Disable the progress spinner (also accepted as -np)
    #[arg(long)]
    pub no_progress: bool,

    /// Path to configuration file (overrides discovery)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Root directory for analysis workspaces
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Default per-tool time budget in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Report installed and missing tools, then exit
    #[arg(long)]
    pub check_deps: bool,

    /// Emit the dependency report as JSON
    #[arg(long, requires = "check_deps")]
    pub json: bool,

    /// Files to analyse
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,
}

impl Cli {
    /// Batch mode was requested or implied.
    #[must_use]
    pub fn is_batch(&self) -> bool {
        self.batch || self.files.len() > 1
    }
}

/// Rewrite the single-dash `-np` spelling to `--no-progress`.
///
/// Arguments after `--` are left alone so a file literally named `-np` can
/// still be analysed.
#[must_use]
pub fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator,
    I::Item: Into<OsString>,
{
    let mut after_separator = false;
    args.into_iter()
        .map(Into::into)
        .map(|arg| {
            if after_separator {
                arg
            } else if arg == "--" {
                after_separator = true;
                arg
            } else if arg == "-np" {
                OsString::from("--no-progress")
            } else {
                arg
            }
        })
        .collect()
}

/// Parse an argv (program name first).
pub fn parse_from<I>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator,
    I::Item: Into<OsString>,
{
    Cli::try_parse_from(normalize_args(args))
}
