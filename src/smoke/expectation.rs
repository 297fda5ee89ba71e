//! Expectation definitions
//!
//! Expectations are authored as a YAML (or JSON) list:
//!
//! ```yaml
//! - requestedUrl: http://localhost:10200/preload.html
//!   lhr:
//!     finalUrl: http://localhost:10200/preload.html
//!     audits:
//!       uses-rel-preload:
//!         score: ">=0.9"
//!   artifacts:
//!     HostUserAgent: /Chrome/
//! ```

use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::Path;

use crate::common::{Error, Result};

/// Expected outcome of running the tool against one URL
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Expectation {
    /// URL passed to the tool
    pub requested_url: String,
    /// Partial expected result; only the listed keys are checked
    #[serde(default)]
    pub lhr: Map<String, Value>,
    /// Partial expected artifacts
    pub artifacts: Option<Map<String, Value>>,
    /// Expected warn/error lines; only ever populated from a snapshot
    #[serde(skip)]
    error_lines: Option<Vec<String>>,
}

impl Expectation {
    pub fn new(requested_url: impl Into<String>) -> Self {
        Self {
            requested_url: requested_url.into(),
            lhr: Map::new(),
            artifacts: None,
            error_lines: None,
        }
    }

    /// Expected result with `requestedUrl` merged in
    pub fn expected_lhr(&self) -> Map<String, Value> {
        let mut lhr = self.lhr.clone();
        lhr.entry("requestedUrl")
            .or_insert_with(|| Value::String(self.requested_url.clone()));
        lhr
    }

    /// Expected warn/error lines, if a baseline exists
    pub fn error_lines(&self) -> Option<&[String]> {
        self.error_lines.as_deref()
    }

    /// Set the expected warn/error lines from a snapshot
    ///
    /// Fails if they were already set.
    pub fn set_error_lines(&mut self, lines: Vec<String>) -> Result<()> {
        if self.error_lines.is_some() {
            return Err(Error::ErrorLinesAlreadySet(self.requested_url.clone()));
        }
        self.error_lines = Some(lines);
        Ok(())
    }
}

/// Load the expectation list from a YAML or JSON file
pub fn load_expectations(path: &Path) -> Result<Vec<Expectation>> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::file_read(path, e))?;
    parse_expectations(&content)
}

/// Parse an expectation list
pub fn parse_expectations(content: &str) -> Result<Vec<Expectation>> {
    Ok(serde_yaml::from_str(content)?)
}
