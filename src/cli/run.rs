//! CLI entry point and dispatch
//!
//! `run()` owns all terminal output, including errors, and returns the exit
//! code for `main` to apply.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use stegtriage_config::{CliArgs, Config};
use stegtriage_engine::registry::{PathProbe, check_dependencies};
use stegtriage_engine::{Engine, QuitOnInterrupt};
use stegtriage_runner::InterruptFlag;
use stegtriage_utils::error::{ConfigError, StegError, UserFriendlyError};
use stegtriage_utils::exit_codes::ExitCode;
use stegtriage_utils::logging;

use super::args::{self, Cli};
use super::prompt::StdioPrompter;

/// Parse the process arguments and run.
pub fn run() -> Result<(), ExitCode> {
    run_with_args(std::env::args_os())
}

/// Run with an explicit argv (program name first).
pub fn run_with_args<I>(argv: I) -> Result<(), ExitCode>
where
    I: IntoIterator,
    I::Item: Into<OsString>,
{
    let cli = match args::parse_from(argv) {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // --help and --version arrive here too
            return if e.use_stderr() {
                Err(ExitCode::FAILURE)
            } else {
                Ok(())
            };
        }
    };

    if let Err(e) = logging::init_tracing(cli.verbose) {
        eprintln!("Warning: failed to initialise logging: {e}");
    }

    if cli.check_deps {
        return check_deps(cli.json);
    }

    if cli.files.is_empty() && !cli.interactive {
        eprintln!("Error: no input file given\n\nUsage: stegtriage [OPTIONS] <FILE>...\n\nFor more information, try '--help'.");
        return Err(ExitCode::FAILURE);
    }
    if cli.interactive && cli.files.len() > 1 {
        eprintln!("Error: interactive mode analyses one file at a time");
        return Err(ExitCode::FAILURE);
    }

    let config = load_config(&cli)?;
    if cli.verbose {
        print_effective_config(&config);
    }

    let interrupts = match InterruptFlag::install() {
        Ok(flag) => Some(flag),
        Err(e) => {
            tracing::warn!("Ctrl-C handling unavailable: {e}");
            None
        }
    };
    let engine = Engine::native(config, interrupts).with_progress(!cli.no_progress);

    if cli.interactive {
        run_interactive(&engine, cli.files.first().map(PathBuf::as_path))
    } else if cli.is_batch() {
        run_batch(&engine, &cli.files)
    } else {
        run_single(&engine, &cli.files[0])
    }
}

fn report(err: &StegError) -> ExitCode {
    eprintln!("{}", err.display_for_user());
    err.to_exit_code()
}

fn load_config(cli: &Cli) -> Result<Config, ExitCode> {
    let cli_args = CliArgs {
        config_path: cli.config.clone(),
        output_dir: cli.output_dir.clone(),
        tool_timeout: cli.timeout,
        security_level: cli.security,
    };

    Config::discover(&cli_args).map_err(|err| {
        report_config_error(&err);
        ExitCode::FAILURE
    })
}

/// Print a config failure with its cause chain and, for known config
/// errors, the remediation hints.
fn report_config_error(err: &anyhow::Error) {
    eprintln!("Error: {err:#}");
    let Some(config_error) = err.downcast_ref::<ConfigError>() else {
        return;
    };
    let suggestions = config_error.suggestions();
    if !suggestions.is_empty() {
        eprintln!("\nSuggestions:");
        for suggestion in suggestions {
            eprintln!("  • {suggestion}");
        }
    }
}

fn print_effective_config(config: &Config) {
    eprintln!("Effective configuration:");
    if let Some(path) = &config.config_path {
        eprintln!("  (from {})", path.display());
    }
    for (key, value, source) in config.effective_config() {
        eprintln!("  {key} = {value} [{source}]");
    }
}

/// Exit 0 when every required tool is installed.
fn check_deps(json: bool) -> Result<(), ExitCode> {
    let report = check_dependencies(&PathProbe);

    if json {
        match serde_json::to_string_pretty(&report) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                eprintln!("Error: failed to serialise dependency report: {e}");
                return Err(ExitCode::FAILURE);
            }
        }
    } else {
        print!("{}", report.render_text());
    }

    if report.all_required_present() {
        Ok(())
    } else {
        Err(ExitCode::FAILURE)
    }
}

fn run_single(engine: &Engine, input: &Path) -> Result<(), ExitCode> {
    match engine.analyze(input, &mut QuitOnInterrupt) {
        Ok(run) => {
            println!("Results: {}", run.workspace().root().display());
            Ok(())
        }
        Err(err) => Err(report(&err)),
    }
}

fn run_batch(engine: &Engine, inputs: &[PathBuf]) -> Result<(), ExitCode> {
    let batch = engine
        .run_batch(inputs, &mut QuitOnInterrupt)
        .map_err(|err| report(&err))?;

    println!(
        "Batch: {}/{} file(s) analysed",
        batch.succeeded, batch.attempted
    );
    for workspace in &batch.workspaces {
        println!("  Results: {}", workspace.display());
    }
    for failure in &batch.failures {
        eprintln!("  ✗ {}: {}", failure.input.display(), failure.error);
    }

    match batch.exit_code() {
        ExitCode::SUCCESS => Ok(()),
        code => Err(code),
    }
}

fn run_interactive(engine: &Engine, initial: Option<&Path>) -> Result<(), ExitCode> {
    let mut prompter = StdioPrompter;
    let run = engine
        .start_interactive_run(initial, &mut prompter)
        .map_err(|err| report(&err))?;

    println!("Workspace: {}", run.workspace().root().display());
    let run = engine
        .interactive_session(run, &mut prompter)
        .map_err(|err| report(&err))?;
    println!("Results: {}", run.workspace().root().display());
    Ok(())
}
