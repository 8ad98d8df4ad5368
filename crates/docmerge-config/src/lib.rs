//! Configuration management for docmerge.
//!
//! Parses `docmerge.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use docmerge_fields::Selector;
use serde::Deserialize;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override the policy for fields without a value.
    pub on_missing: Option<MissingPolicy>,
    /// Override the block selector used by [`MissingPolicy::RemoveBlock`].
    pub block: Option<String>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "docmerge.toml";

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Merge behaviour.
    pub merge: MergeConfig,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// What to do with a merge field whose value is missing or null.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MissingPolicy {
    /// Leave the field untouched.
    #[default]
    Keep,
    /// Remove the field.
    Remove,
    /// Remove the enclosing block once every field in it is missing.
    RemoveBlock,
}

impl MissingPolicy {
    fn as_str(self) -> &'static str {
        match self {
            Self::Keep => "keep",
            Self::Remove => "remove",
            Self::RemoveBlock => "remove-block",
        }
    }
}

impl fmt::Display for MissingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MissingPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [Self::Keep, Self::Remove, Self::RemoveBlock]
            .into_iter()
            .find(|policy| policy.as_str() == s)
            .ok_or_else(|| {
                ConfigError::Validation(format!(
                    "unknown missing-field policy `{s}` (expected keep, remove or remove-block)"
                ))
            })
    }
}

/// Merge configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Policy for fields without a value.
    pub on_missing: MissingPolicy,
    /// Selector of the block removed by [`MissingPolicy::RemoveBlock`].
    pub block: String,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            on_missing: MissingPolicy::Keep,
            block: "w:p".to_owned(),
        }
    }
}

impl MergeConfig {
    /// Parsed block selector.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if `merge.block` is not a supported selector.
    pub fn block_selector(&self) -> Result<Selector, ConfigError> {
        Selector::parse(&self.block)
            .map_err(|e| ConfigError::Validation(format!("merge.block: {e}")))
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `docmerge.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading, allowing CLI arguments to take
    /// precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails or
    /// the resulting configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = std::env::current_dir()
            .ok()
            .and_then(|cwd| Self::discover_from(&cwd))
        {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }
        config.validate()?;

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(on_missing) = settings.on_missing {
            self.merge.on_missing = on_missing;
        }
        if let Some(block) = &settings.block {
            self.merge.block.clone_from(block);
        }
    }

    /// Search for config file in `start` and its parents.
    fn discover_from(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.merge.block_selector()?;
        Ok(())
    }
}
