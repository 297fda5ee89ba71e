//! Configuration file handling

use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::paths::{config_path, crate_dir};
use super::{Error, Result};

/// Environment variable that overrides the tool binary
pub const TOOL_ENV_VAR: &str = "LIGHTHOUSE_BIN";

/// Environment variable that overrides the config file location
pub const CONFIG_ENV_VAR: &str = "SMOKEHOUSE_CONFIG";

/// Name searched for on PATH when no binary is configured
const DEFAULT_TOOL_NAME: &str = "lighthouse";

/// Main configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// How to invoke the external tool
    #[serde(default)]
    pub tool: ToolConfig,

    /// Retry settings for flaky browser connections
    #[serde(default)]
    pub retry: RetryConfig,

    /// Where inputs, snapshots and timing data live
    #[serde(default)]
    pub paths: PathsConfig,
}

/// Configuration for the external tool
#[derive(Debug, Deserialize, Default, Clone)]
pub struct ToolConfig {
    /// Path to the tool executable
    pub path: Option<PathBuf>,

    /// Arguments placed before the URL (e.g. a script for an interpreter)
    #[serde(default)]
    pub args: Vec<String>,
}

/// Retry settings
#[derive(Debug, Deserialize, Clone)]
pub struct RetryConfig {
    /// Retries after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Exit code the tool uses for a debugger protocol timeout
    #[serde(default = "default_protocol_timeout_exit_code")]
    pub protocol_timeout_exit_code: i32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            protocol_timeout_exit_code: default_protocol_timeout_exit_code(),
        }
    }
}

fn default_max_retries() -> u32 {
    3
}
fn default_protocol_timeout_exit_code() -> i32 {
    67
}

/// Path settings
#[derive(Debug, Deserialize, Clone)]
pub struct PathsConfig {
    /// Base directory for module-relative `--config-path`/`--expectations-path`
    #[serde(default = "default_smoke_dir")]
    pub smoke_dir: PathBuf,

    /// Where stderr snapshots are stored (defaults to `<smoke_dir>/snapshots`)
    pub snapshot_dir: Option<PathBuf>,

    /// Root for timing collections
    #[serde(default = "default_timing_data_dir")]
    pub timing_data_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            smoke_dir: default_smoke_dir(),
            snapshot_dir: None,
            timing_data_dir: default_timing_data_dir(),
        }
    }
}

fn default_smoke_dir() -> PathBuf {
    crate_dir().join("smoke")
}
fn default_timing_data_dir() -> PathBuf {
    crate_dir().join(".tmp").join("timing-data")
}

impl PathsConfig {
    pub fn snapshot_dir(&self) -> PathBuf {
        self.snapshot_dir
            .clone()
            .unwrap_or_else(|| self.smoke_dir.join("snapshots"))
    }
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// `SMOKEHOUSE_CONFIG` points at an explicit file instead. Returns
    /// default configuration if the default file doesn't exist.
    pub fn load() -> Result<Self> {
        if let Some(path) = std::env::var_os(CONFIG_ENV_VAR) {
            return Self::load_from(Path::new(&path));
        }

        if let Some(path) = config_path() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }
        Ok(Self::default())
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::file_read(path, e))?;
        Self::parse(&content)
    }

    fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::ConfigParse(e.to_string()))
    }

    /// Locate the tool executable
    ///
    /// `LIGHTHOUSE_BIN` wins over the config file, which wins over PATH.
    pub fn tool_path(&self) -> Result<PathBuf> {
        if let Some(path) = std::env::var_os(TOOL_ENV_VAR) {
            return Ok(PathBuf::from(path));
        }

        if let Some(path) = &self.tool.path {
            return Ok(path.clone());
        }

        which::which(DEFAULT_TOOL_NAME).map_err(|_| Error::ToolNotFound {
            name: DEFAULT_TOOL_NAME.to_string(),
            config: config_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "config.toml".to_string()),
        })
    }
}
