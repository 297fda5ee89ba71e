//! Typed views over the tool's JSON result
//!
//! The result schema belongs to the tool. Only the fields the harness reads
//! are narrowed here; everything else stays as raw JSON for comparison.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

use crate::common::Result;

/// Runtime error code older result shapes use to mean "no error"
const NO_ERROR_CODE: &str = "NO_ERROR";

/// Narrowed view of a result file
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LhrView {
    /// URL the run was requested for
    pub requested_url: Option<String>,
    /// Set when the tool itself failed internally
    pub runtime_error: Option<RuntimeError>,
    /// Internal timing log
    pub timing: Option<Timing>,
}

/// A runtime error reported inside the result
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RuntimeError {
    pub code: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// Timing log of a single run
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Timing {
    #[serde(default)]
    pub entries: Vec<TimingEntry>,
    /// Total run time in milliseconds
    pub total: Option<f64>,
}

/// One measurement in the timing log
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimingEntry {
    pub name: String,
    pub duration: f64,
    pub start_time: Option<f64>,
    pub entry_type: Option<String>,
}

impl LhrView {
    /// Narrow a raw result into the fields the harness reads
    pub fn from_value(value: &Value) -> Result<Self> {
        Ok(Self::deserialize(value)?)
    }

    /// The runtime error, ignoring the legacy `NO_ERROR` placeholder
    pub fn runtime_error(&self) -> Option<&RuntimeError> {
        self.runtime_error
            .as_ref()
            .filter(|err| err.code != NO_ERROR_CODE)
    }

    /// Timing entries, empty when the result has no timing log
    pub fn timing_entries(&self) -> &[TimingEntry] {
        self.timing
            .as_ref()
            .map(|t| t.entries.as_slice())
            .unwrap_or_default()
    }
}

/// Everything captured from one smoke invocation
#[derive(Debug)]
pub struct RunResult {
    /// Raw result JSON
    pub lhr: Value,
    /// Narrowed view of `lhr`
    pub view: LhrView,
    /// Saved artifacts keyed by name (empty object when none were saved)
    pub artifacts: Value,
    /// Raw stderr of the final attempt
    pub stderr: String,
    /// Normalized warn/error lines from stderr
    pub error_lines: Vec<String>,
    /// Exit code of the final attempt
    pub exit_code: i32,
    /// Output directory, only retained in debug mode
    pub output_dir: Option<PathBuf>,
}
