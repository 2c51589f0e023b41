/// Viewer settings loaded from YAML
use std::path::{Path, PathBuf};

use log::{debug, LevelFilter};
use partview_core::{Rgb, VrConfig, VrError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "partview.yaml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("invalid config file {}: {source}", path.display())]
    Invalid { path: PathBuf, source: VrError },
    #[error("invalid log level `{0}`")]
    LogLevel(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Target frames per second of the interactive loop
    pub fps: u32,
    /// Radians per rotate key press
    pub rotation_step: f32,
    /// Slowly spin the model when idle
    pub auto_rotate: bool,
    /// Colour given to parts created from opened files
    pub default_colour: Rgb,
    /// Number of "TopLevel N" parts created at startup
    pub initial_parts: usize,
    /// Width of the part tree pane, in columns
    pub tree_width: u16,
    pub status_timeout_ms: u64,
    pub log_level: String,
    pub vr: VrConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fps: 30,
            rotation_step: 0.1,
            auto_rotate: false,
            default_colour: Rgb::new(255, 99, 71),
            initial_parts: 1,
            tree_width: 32,
            status_timeout_ms: 3000,
            log_level: "warn".to_string(),
            vr: VrConfig::default(),
        }
    }
}

impl Config {
    pub fn from_yaml(text: &str, path: &Path) -> Result<Config, ConfigError> {
        let config: Config = serde_yaml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.vr.validate().map_err(|source| ConfigError::Invalid {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("loading config from {}", path.display());
        Self::from_yaml(&text, path)
    }

    /// Load `explicit` if given, otherwise [`DEFAULT_CONFIG_FILE`] from
    /// `dir` when present, otherwise the defaults
    pub fn discover(explicit: Option<&Path>, dir: &Path) -> Result<Config, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let candidate = dir.join(DEFAULT_CONFIG_FILE);
        if candidate.is_file() {
            Self::load(&candidate)
        } else {
            Ok(Config::default())
        }
    }

    pub fn level_filter(&self) -> Result<LevelFilter, ConfigError> {
        self.log_level
            .parse()
            .map_err(|_| ConfigError::LogLevel(self.log_level.clone()))
    }
}
