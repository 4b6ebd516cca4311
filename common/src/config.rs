use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::types::DEFAULT_EXPORT_FILENAME;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

pub const ENV_BASE_URL: &str = "SLIDESYNTH_BASE_URL";
pub const ENV_TIMEOUT_SECS: &str = "SLIDESYNTH_TIMEOUT_SECS";
pub const ENV_OUTPUT_DIR: &str = "SLIDESYNTH_OUTPUT_DIR";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot find config directory")]
    NoConfigDir,
    #[error("Failed to access config file {path}: {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file: {source}")]
    ParseError { source: serde_json::Error },
    #[error("Failed to parse TOML config: {source}")]
    TomlParseError { source: toml::de::Error },
    #[error("Failed to render TOML config: {source}")]
    TomlWriteError { source: toml::ser::Error },
    #[error("Invalid configuration value: {field} = {value}")]
    InvalidValue { field: String, value: String },
}

/// Client settings: where the slide service lives and where exports land.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthConfig {
    /// Base URL of the slide service
    pub base_url: String,
    /// Client-side timeout applied to every request
    pub timeout_secs: u64,
    /// Filename for exports when none is given
    pub default_filename: String,
    /// Directory exported presentations are saved into
    pub output_dir: PathBuf,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            default_filename: DEFAULT_EXPORT_FILENAME.to_string(),
            output_dir: PathBuf::from("."),
        }
    }
}

impl SynthConfig {
    /// Default config file location.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(dir.join("slidesynth").join("config.json"))
    }

    /// Load configuration from file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::IoError {
            path: path.display().to_string(),
            source,
        })?;

        if is_toml(path) {
            toml::from_str(&contents).map_err(|source| ConfigError::TomlParseError { source })
        } else {
            serde_json::from_str(&contents).map_err(|source| ConfigError::ParseError { source })
        }
    }

    /// Load from `explicit` (must exist) or the default location (may be
    /// absent), then apply environment overrides.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match explicit {
            Some(path) => Self::load_from_file(path)?,
            None => match Self::config_path() {
                Ok(path) if path.exists() => {
                    let config = Self::load_from_file(&path)?;
                    tracing::info!("Loaded configuration from {}", path.display());
                    config
                }
                _ => {
                    tracing::debug!("Using default configuration");
                    Self::default()
                }
            },
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `SLIDESYNTH_*` environment overrides.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_BASE_URL).filter(|v| !v.is_empty()) {
            self.base_url = url;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS).filter(|v| !v.is_empty()) {
            self.timeout_secs = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                field: ENV_TIMEOUT_SECS.to_string(),
                value: raw.clone(),
            })?;
        }
        if let Some(dir) = lookup(ENV_OUTPUT_DIR).filter(|v| !v.is_empty()) {
            self.output_dir = PathBuf::from(dir);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                field: "base_url".to_string(),
                value: self.base_url.clone(),
            });
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "timeout_secs".to_string(),
                value: "0".to_string(),
            });
        }
        if self.default_filename.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "default_filename".to_string(),
                value: self.default_filename.clone(),
            });
        }
        Ok(())
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = if is_toml(path) {
            toml::to_string_pretty(self).map_err(|source| ConfigError::TomlWriteError { source })?
        } else {
            serde_json::to_string_pretty(self).map_err(|source| ConfigError::ParseError { source })?
        };

        let io_err = |source| ConfigError::IoError {
            path: path.display().to_string(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        std::fs::write(path, contents).map_err(io_err)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn is_toml(path: &Path) -> bool {
    path.extension().and_then(|s| s.to_str()) == Some("toml")
}
