//! Environment-driven configuration; these mutate process env so run serially

use std::fs;
use std::path::PathBuf;

use serial_test::serial;
use stegtriage::config::OUTPUT_DIR_ENV;
use stegtriage::utils::types::ConfigSource;
use stegtriage::{CliArgs, Config};
use tempfile::TempDir;

struct EnvGuard;

impl EnvGuard {
    fn set(value: &str) -> Self {
        // SAFETY: every test touching the variable is #[serial]
        unsafe { std::env::set_var(OUTPUT_DIR_ENV, value) };
        Self
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        // SAFETY: see EnvGuard::set
        unsafe { std::env::remove_var(OUTPUT_DIR_ENV) };
    }
}

fn isolated_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join(".git")).unwrap();
    dir
}

#[test]
#[serial]
fn test_env_output_dir_beats_config_file() {
    let dir = isolated_dir();
    fs::create_dir(dir.path().join(".stegtriage")).unwrap();
    fs::write(
        dir.path().join(".stegtriage/config.toml"),
        "[defaults]\noutput_dir = \"from-file\"\ntool_timeout = 45\n",
    )
    .unwrap();
    let _env = EnvGuard::set("from-env");

    let config = Config::discover_from(dir.path(), &CliArgs::default()).unwrap();

    assert_eq!(config.defaults.output_dir, PathBuf::from("from-env"));
    assert_eq!(config.source_of("output_dir"), ConfigSource::Env);
    assert_eq!(config.defaults.tool_timeout, 45);
    assert_eq!(config.source_of("tool_timeout"), ConfigSource::Config);
}

#[test]
#[serial]
fn test_cli_output_dir_beats_env() {
    let dir = isolated_dir();
    let _env = EnvGuard::set("from-env");
    let cli = CliArgs {
        output_dir: Some(PathBuf::from("from-cli")),
        ..CliArgs::default()
    };

    let config = Config::discover_from(dir.path(), &cli).unwrap();

    assert_eq!(config.defaults.output_dir, PathBuf::from("from-cli"));
    assert_eq!(config.source_of("output_dir"), ConfigSource::Cli);
}

#[test]
#[serial]
fn test_empty_env_value_is_ignored() {
    let dir = isolated_dir();
    let _env = EnvGuard::set("");

    let config = Config::discover_from(dir.path(), &CliArgs::default()).unwrap();

    assert_eq!(config.source_of("output_dir"), ConfigSource::Default);
}
