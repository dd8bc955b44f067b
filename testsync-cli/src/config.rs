//! Configuration management

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use testsync_core::{SyncSettings, DEFAULT_PROPERTY_NAME};

use crate::error::{CliError, Result};

pub const CONFIG_FILE_NAME: &str = ".testsync.toml";
pub const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sync: SyncConfig,

    #[serde(default)]
    pub run: RunConfig,

    #[serde(default)]
    pub verbose: VerboseConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_dir: Option<PathBuf>,

    #[serde(default = "default_property_name")]
    pub property_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_workers")]
    pub workers: usize,

    #[serde(default)]
    pub fail_fast: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerboseConfig {
    #[serde(default)]
    pub configuration: bool,

    #[serde(default)]
    pub synchronizer: bool,
}

impl Default for Config {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG).unwrap_or_else(|_| Self {
            sync: SyncConfig::default(),
            run: RunConfig::default(),
            verbose: VerboseConfig::default(),
        })
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            tags: Vec::new(),
            temp_dir: None,
            property_name: default_property_name(),
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            fail_fast: false,
        }
    }
}

impl SyncConfig {
    /// Settings handed to the coordinator and the worker listener
    pub fn settings(&self) -> SyncSettings {
        let settings = SyncSettings::default().with_property_name(self.property_name.clone());
        match &self.temp_dir {
            Some(dir) => settings.with_temp_dir(dir.clone()),
            None => settings,
        }
    }
}

impl Config {
    /// Load configuration from file or use defaults
    pub fn load() -> Result<Self> {
        // Try project config first
        let project_config = Path::new(CONFIG_FILE_NAME);
        if project_config.exists() {
            return Self::load_from_path(project_config);
        }

        // Try user config
        if let Some(user_config) = Self::user_config_path() {
            if user_config.exists() {
                return Self::load_from_path(&user_config);
            }
        }

        Ok(Self::default())
    }

    pub fn load_from_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let contents = fs::read_to_string(&path).map_err(|_| {
            CliError::ConfigError(format!("Could not read config file: {}", path.display()))
        })?;

        toml::from_str(&contents).map_err(|e| {
            CliError::ConfigError(format!("Invalid config file {}: {}", path.display(), e))
        })
    }

    fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("testsync").join("config.toml"))
    }

    /// Save configuration to file
    pub fn save(&self, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();
        let contents = toml::to_string_pretty(self)
            .map_err(|e| CliError::ConfigError(format!("Failed to serialize config: {}", e)))?;

        fs::write(&path, contents)?;
        Ok(())
    }
}

fn default_property_name() -> String {
    DEFAULT_PROPERTY_NAME.to_string()
}

fn default_workers() -> usize {
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.sync.tags.is_empty());
        assert_eq!(config.sync.property_name, "TESTSYNC_SYNC_PROPERTY");
        assert_eq!(config.run.workers, 1);
        assert!(!config.verbose.configuration);
    }

    #[test]
    fn test_config_serialization() {
        let mut config = Config::default();
        config.sync.tags = vec!["db".to_string()];
        let toml_str = toml::to_string(&config).unwrap();
        let deserialized: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(deserialized.sync.tags, vec!["db".to_string()]);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = toml::from_str("[sync]\ntags = [\"db\", \"cache\"]\n").unwrap();
        assert_eq!(config.sync.tags.len(), 2);
        assert_eq!(config.sync.property_name, DEFAULT_PROPERTY_NAME);
        assert_eq!(config.run.workers, 1);
    }

    #[test]
    fn test_settings_carry_temp_dir() {
        let mut config = Config::default();
        config.sync.temp_dir = Some(PathBuf::from("/var/tmp"));
        config.sync.property_name = "CUSTOM".to_string();
        let settings = config.sync.settings();
        assert_eq!(settings.temp_dir, Some(PathBuf::from("/var/tmp")));
        assert_eq!(settings.property_name, "CUSTOM");
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[run]\nworkers = \"many\"\n").unwrap();
        assert!(matches!(
            Config::load_from_path(&path),
            Err(CliError::ConfigError(_))
        ));
    }
}
