//! Error types for the smoke harness
//!
//! Every variant here aborts the whole batch. Ordinary assertion mismatches
//! are not errors; they are tallied by the collate step instead.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the harness
#[derive(Error, Debug)]
pub enum Error {
    // === Tool Invocation Errors ===
    #[error("Lighthouse binary '{name}' not found. Set LIGHTHOUSE_BIN or [tool] path in {config}")]
    ToolNotFound { name: String, config: String },

    #[error("Failed to launch Lighthouse: {0}")]
    ToolLaunch(#[source] io::Error),

    #[error("Protocol timed out connecting to the browser for {url}; gave up after {attempts} attempts")]
    RetriesExhausted { url: String, attempts: u32 },

    #[error("Lighthouse exited with code {code} and produced no result for {url}")]
    ToolCrashed {
        url: String,
        code: i32,
        stderr: String,
    },

    #[error("Lighthouse exit code {code} disagrees with runtimeError ({runtime_error}) for {url}")]
    ExitCodeMismatch {
        url: String,
        code: i32,
        runtime_error: String,
    },

    #[error("Lighthouse failed collecting {url} (exit code {code})")]
    CollectionFailed { url: String, code: i32 },

    // === Harness Misuse ===
    #[error("Expected error lines for {0} were already set; they must only come from snapshots")]
    ErrorLinesAlreadySet(String),

    #[error("Timing measurement '{name}' was listed but could not be found in {file}")]
    MeasurementMissing { name: String, file: String },

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    #[error("Invalid measure filter: {0}")]
    InvalidFilter(#[from] regex::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // === Internal Errors ===
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a file read error for a path
    pub fn file_read(path: &std::path::Path, error: impl std::fmt::Display) -> Self {
        Self::FileRead {
            path: path.display().to_string(),
            error: error.to_string(),
        }
    }

    /// Process exit code to terminate with when this error aborts a run
    ///
    /// A crashed tool propagates its own exit code; everything else is 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::ToolCrashed { code, .. } if *code != 0 => *code,
            _ => 1,
        }
    }
}
