use anyhow::{Context, Result};
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

use stegtriage_utils::error::ConfigError;
use stegtriage_utils::types::ConfigSource;

use super::model::{Defaults, OUTPUT_DIR_ENV, TomlConfig};
use super::{CliArgs, Config};

/// Directory searched for `config.toml`
const CONFIG_DIR_NAME: &str = ".stegtriage";

impl Config {
    /// Discover and load configuration with precedence: CLI > env > file > defaults
    ///
    /// Uses the current working directory for config file discovery when no
    /// explicit path is provided in `cli_args`.
    pub fn discover(cli_args: &CliArgs) -> Result<Self> {
        let start_dir = env::current_dir().context("Failed to get current directory")?;
        Self::discover_from(&start_dir, cli_args)
    }

    /// Discover and load configuration starting from a specific directory
    pub fn discover_from(start_dir: &Path, cli_args: &CliArgs) -> Result<Self> {
        let env_output_dir = env::var_os(OUTPUT_DIR_ENV).map(PathBuf::from);
        Self::resolve(start_dir, cli_args, env_output_dir)
    }

    /// Path-driven core of discovery; environment values are passed in so
    /// tests never touch process-global state.
    fn resolve(
        start_dir: &Path,
        cli_args: &CliArgs,
        env_output_dir: Option<PathBuf>,
    ) -> Result<Self> {
        let mut source_attribution = HashMap::new();
        let mut defaults = Defaults::default();
        let mut tools = Default::default();

        for key in [
            "output_dir",
            "tool_timeout",
            "security_level",
            "max_file_size",
            "kill_grace_ms",
            "wordlist",
        ] {
            source_attribution.insert(key.to_string(), ConfigSource::Default);
        }

        let config_path = match &cli_args.config_path {
            Some(explicit) => {
                if !explicit.is_file() {
                    return Err(ConfigError::InvalidFile(format!(
                        "{} does not exist",
                        explicit.display()
                    ))
                    .into());
                }
                Some(explicit.clone())
            }
            None => Self::discover_config_file_from(start_dir)?,
        };

        if let Some(path) = &config_path {
            let file_config = Self::load_config_file(path)
                .with_context(|| format!("Failed to load config file: {}", path.display()))?;

            if let Some(file_defaults) = file_config.defaults {
                let mut apply = |key: &str| {
                    source_attribution.insert(key.to_string(), ConfigSource::Config);
                };
                if let Some(value) = file_defaults.output_dir {
                    defaults.output_dir = value;
                    apply("output_dir");
                }
                if let Some(value) = file_defaults.tool_timeout {
                    defaults.tool_timeout = value;
                    apply("tool_timeout");
                }
                if let Some(value) = file_defaults.security_level {
                    defaults.security_level = value;
                    apply("security_level");
                }
                if let Some(value) = file_defaults.max_file_size {
                    defaults.max_file_size = value;
                    apply("max_file_size");
                }
                if let Some(value) = file_defaults.kill_grace_ms {
                    defaults.kill_grace_ms = value;
                    apply("kill_grace_ms");
                }
                if let Some(value) = file_defaults.wordlist {
                    defaults.wordlist = value;
                    apply("wordlist");
                }
            }

            tools = file_config.tools;
        }

        if let Some(dir) = env_output_dir.filter(|d| !d.as_os_str().is_empty()) {
            defaults.output_dir = dir;
            source_attribution.insert("output_dir".to_string(), ConfigSource::Env);
        }

        if let Some(dir) = &cli_args.output_dir {
            defaults.output_dir = dir.clone();
            source_attribution.insert("output_dir".to_string(), ConfigSource::Cli);
        }
        if let Some(timeout) = cli_args.tool_timeout {
            defaults.tool_timeout = timeout;
            source_attribution.insert("tool_timeout".to_string(), ConfigSource::Cli);
        }
        if let Some(level) = cli_args.security_level {
            defaults.security_level = level;
            source_attribution.insert("security_level".to_string(), ConfigSource::Cli);
        }

        let config = Self {
            defaults,
            tools,
            config_path,
            source_attribution,
        };

        config.validate()?;

        Ok(config)
    }

    /// Discover config file by searching upward from a given directory
    ///
    /// Walks up the directory tree looking for `.stegtriage/config.toml`,
    /// stopping at repository root markers (.git, .hg, .svn) or filesystem root.
    pub fn discover_config_file_from(start_dir: &Path) -> Result<Option<PathBuf>> {
        let mut current_dir = Some(start_dir);

        while let Some(dir) = current_dir {
            let config_path = dir.join(CONFIG_DIR_NAME).join("config.toml");
            if config_path.is_file() {
                return Ok(Some(config_path));
            }

            if dir.join(".git").exists() || dir.join(".hg").exists() || dir.join(".svn").exists()
            {
                break;
            }

            current_dir = dir.parent();
        }

        Ok(None)
    }

    fn load_config_file(path: &Path) -> Result<TomlConfig> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: TomlConfig = toml::from_str(&content)
            .map_err(|e| ConfigError::InvalidFile(e.to_string()))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;
    use stegtriage_utils::types::{ExitOnePolicy, SecurityLevel};
    use tempfile::TempDir;

    fn write_config(dir: &Path, body: &str) -> PathBuf {
        let config_dir = dir.join(CONFIG_DIR_NAME);
        fs::create_dir_all(&config_dir).unwrap();
        let path = config_dir.join("config.toml");
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_defaults_without_config_file() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join(".git")).unwrap();

        let config = Config::resolve(temp.path(), &CliArgs::default(), None).unwrap();

        assert_eq!(config.defaults, Defaults::default());
        assert!(config.config_path.is_none());
        assert_eq!(config.source_of("tool_timeout"), ConfigSource::Default);
    }

    #[test]
    fn test_discovery_walks_up_to_repo_root() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join(".git")).unwrap();
        let expected = write_config(temp.path(), "[defaults]\ntool_timeout = 60\n");
        let nested = temp.path().join("cases").join("ctf-01");
        fs::create_dir_all(&nested).unwrap();

        let found = Config::discover_config_file_from(&nested).unwrap();
        assert_eq!(found, Some(expected));
    }

    #[test]
    fn test_discovery_stops_at_repo_root() {
        let temp = TempDir::new().unwrap();
        write_config(temp.path(), "[defaults]\ntool_timeout = 60\n");
        let repo = temp.path().join("repo");
        fs::create_dir_all(repo.join(".git")).unwrap();

        assert_eq!(Config::discover_config_file_from(&repo).unwrap(), None);
    }

    #[test]
    fn test_file_values_and_tool_overrides() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join(".git")).unwrap();
        write_config(
            temp.path(),
            r#"
[defaults]
tool_timeout = 120
security_level = "paranoid"
wordlist = "/opt/lists/small.txt"

[tools.stegdetect]
exit_code_one = "success"

[tools.binwalk]
timeout = 1200
"#,
        );

        let config = Config::resolve(temp.path(), &CliArgs::default(), None).unwrap();

        assert_eq!(config.defaults.tool_timeout, 120);
        assert_eq!(config.defaults.security_level, SecurityLevel::Paranoid);
        assert_eq!(config.defaults.wordlist, PathBuf::from("/opt/lists/small.txt"));
        assert_eq!(config.source_of("security_level"), ConfigSource::Config);
        assert_eq!(config.exit_one_policy("stegdetect"), ExitOnePolicy::Success);
        assert_eq!(config.tool_timeout("binwalk"), Duration::from_secs(1200));
        assert_eq!(config.tool_timeout("exiftool"), Duration::from_secs(120));
    }

    #[test]
    fn test_precedence_cli_over_env_over_file() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join(".git")).unwrap();
        write_config(temp.path(), "[defaults]\noutput_dir = \"from-file\"\n");

        let from_env = Config::resolve(
            temp.path(),
            &CliArgs::default(),
            Some(PathBuf::from("from-env")),
        )
        .unwrap();
        assert_eq!(from_env.defaults.output_dir, PathBuf::from("from-env"));
        assert_eq!(from_env.source_of("output_dir"), ConfigSource::Env);

        let cli = CliArgs {
            output_dir: Some(PathBuf::from("from-cli")),
            tool_timeout: Some(5),
            ..CliArgs::default()
        };
        let from_cli = Config::resolve(temp.path(), &cli, Some(PathBuf::from("from-env"))).unwrap();
        assert_eq!(from_cli.defaults.output_dir, PathBuf::from("from-cli"));
        assert_eq!(from_cli.source_of("output_dir"), ConfigSource::Cli);
        assert_eq!(from_cli.defaults.tool_timeout, 5);
    }

    #[test]
    fn test_invalid_toml_is_reported() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join(".git")).unwrap();
        write_config(temp.path(), "[defaults\ntool_timeout = ");

        let err = Config::resolve(temp.path(), &CliArgs::default(), None).unwrap_err();
        assert!(format!("{err:#}").contains("Invalid configuration file"));
    }

    #[test]
    fn test_unknown_exit_policy_rejected() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join(".git")).unwrap();
        write_config(temp.path(), "[tools.zsteg]\nexit_code_one = \"fatal\"\n");

        assert!(Config::resolve(temp.path(), &CliArgs::default(), None).is_err());
    }

    #[test]
    fn test_missing_explicit_config_is_error() {
        let temp = TempDir::new().unwrap();
        let cli = CliArgs {
            config_path: Some(temp.path().join("nope.toml")),
            ..CliArgs::default()
        };
        assert!(Config::resolve(temp.path(), &cli, None).is_err());
    }
}
