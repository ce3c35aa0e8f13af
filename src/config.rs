use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::cli::CliArgs;

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Config {
    /// Directory scanned for repositories at startup.
    pub base_dir: PathBuf,
    /// How many directory levels to descend while scanning.
    #[serde(default = "default_scan_depth")]
    pub scan_depth: usize,
    /// Seconds between silent status refreshes.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
    /// Seconds between automatic fetches; 0 disables auto-fetch.
    #[serde(default)]
    pub fetch_interval_secs: u64,
    /// Repository names (final path segment) excluded from the dashboard.
    #[serde(default)]
    pub ignore_repos: Vec<String>,
}

fn default_scan_depth() -> usize {
    2
}

fn default_refresh_interval() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_dir: dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")),
            scan_depth: default_scan_depth(),
            refresh_interval_secs: default_refresh_interval(),
            fetch_interval_secs: 0,
            ignore_repos: Vec::new(),
        }
    }
}

pub fn get_default_config_path() -> Result<PathBuf> {
    let proj_dirs = ProjectDirs::from("", "", "gitpulse")
        .context("Failed to determine project directories")?;

    Ok(proj_dirs.config_dir().join("gitpulse.toml"))
}

impl Config {
    pub fn load(config_path: Option<PathBuf>) -> Result<Self> {
        let path = match config_path {
            Some(p) => p,
            None => get_default_config_path()?,
        };

        if !path.exists() {
            let default_config = Config::default();
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).context("Failed to create config directory")?;
            }
            default_config.save(&path)?;
            return Ok(default_config);
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(&path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Resolve the final configuration: file values first, CLI flags on top.
    pub fn from_cli_and_file(cli_args: CliArgs, config_path: Option<PathBuf>) -> Result<Self> {
        let mut config = Self::load(config_path)?;

        if let Some(root) = cli_args.root {
            config.base_dir = root;
        }
        if let Some(depth) = cli_args.depth {
            config.scan_depth = depth;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.scan_depth, 2);
        assert_eq!(config.refresh_interval_secs, 30);
        assert_eq!(config.fetch_interval_secs, 0);
        assert!(config.ignore_repos.is_empty());
        assert!(!config.base_dir.as_os_str().is_empty());
    }

    #[test]
    fn test_config_serialization_roundtrip() -> Result<()> {
        let mut config = Config::default();
        config.base_dir = PathBuf::from("/test/path");
        config.fetch_interval_secs = 300;
        config.ignore_repos.push("scratch".to_string());

        let toml_str = toml::to_string(&config)?;
        let parsed_config: Config = toml::from_str(&toml_str)?;

        assert_eq!(config, parsed_config);
        Ok(())
    }

    #[test]
    fn test_config_load_nonexistent_creates_default() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("nonexistent.toml");

        let config = Config::load(Some(config_path.clone()))?;

        assert_eq!(config.refresh_interval_secs, 30);
        assert!(config_path.exists());

        Ok(())
    }

    #[test]
    fn test_config_missing_fields_use_defaults() -> Result<()> {
        let config: Config = toml::from_str("base_dir = \"/somewhere\"")?;
        assert_eq!(config.base_dir, PathBuf::from("/somewhere"));
        assert_eq!(config.scan_depth, 2);
        assert_eq!(config.refresh_interval_secs, 30);
        assert_eq!(config.fetch_interval_secs, 0);
        Ok(())
    }

    #[test]
    fn test_config_save_and_load() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("test.toml");

        let mut config = Config::default();
        config.base_dir = PathBuf::from("/custom/path");
        config.scan_depth = 5;

        config.save(&config_path)?;
        let loaded_config = Config::load(Some(config_path))?;

        assert_eq!(config.base_dir, loaded_config.base_dir);
        assert_eq!(config.scan_depth, loaded_config.scan_depth);

        Ok(())
    }

    #[test]
    fn test_cli_override() -> Result<()> {
        let cli_args = CliArgs {
            root: Some(PathBuf::from("/override/path")),
            depth: Some(4),
            config: None,
        };

        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("test.toml");

        let original_config = Config {
            base_dir: PathBuf::from("/original/path"),
            ..Config::default()
        };
        original_config.save(&config_path)?;

        let final_config = Config::from_cli_and_file(cli_args, Some(config_path))?;
        assert_eq!(final_config.base_dir, PathBuf::from("/override/path"));
        assert_eq!(final_config.scan_depth, 4);

        Ok(())
    }
}
