//! Tool invocation
//!
//! Every invocation is awaited to completion before the next one starts;
//! concurrent runs of the tool fight over browser ports.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use colored::Colorize;
use serde_json::Value;
use tokio::process::Command as TokioCommand;

use crate::common::config::{Config, RetryConfig};
use crate::common::{Error, Result};
use crate::smoke::normalize::normalize_stderr;

use super::result::{LhrView, RunResult};

/// Name of the result file inside a smoke run's output directory
const LHR_FILE: &str = "lhr.json";
/// Directory the tool saves artifacts into
const ARTIFACTS_DIR: &str = "artifacts";
/// File the tool writes artifacts to inside `ARTIFACTS_DIR`
const ARTIFACTS_FILE: &str = "artifacts.json";

/// Captured output of one tool process
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Exit code; a process killed by a signal counts as 1
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Retry state of a single tool invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    Idle,
    /// Running the n-th attempt (1-based)
    Attempting(u32),
    /// The tool finished with something other than a protocol timeout
    Success,
    /// The n-th attempt hit a protocol timeout
    RetryableFailure(u32),
    FatalFailure,
}

impl Attempt {
    /// Begin the first attempt
    pub fn start(self) -> Self {
        match self {
            Attempt::Idle => Attempt::Attempting(1),
            other => other,
        }
    }

    /// Record the exit code of the current attempt
    pub fn finish(self, code: i32, policy: &RetryConfig) -> Self {
        match self {
            Attempt::Attempting(n) if code == policy.protocol_timeout_exit_code => {
                Attempt::RetryableFailure(n)
            }
            Attempt::Attempting(_) => Attempt::Success,
            other => other,
        }
    }

    /// Move a retryable failure to the next attempt, or give up
    pub fn retry(self, policy: &RetryConfig) -> Self {
        match self {
            Attempt::RetryableFailure(n) if n <= policy.max_retries => Attempt::Attempting(n + 1),
            Attempt::RetryableFailure(_) => Attempt::FatalFailure,
            other => other,
        }
    }
}

/// Spawns the external tool
#[derive(Debug, Clone)]
pub struct ToolRunner {
    program: PathBuf,
    prefix_args: Vec<String>,
    retry: RetryConfig,
}

impl ToolRunner {
    pub fn new(program: PathBuf, prefix_args: Vec<String>, retry: RetryConfig) -> Self {
        Self {
            program,
            prefix_args,
            retry,
        }
    }

    /// Build a runner from the harness configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            config.tool_path()?,
            config.tool.args.clone(),
            config.retry.clone(),
        ))
    }

    /// Run the tool once against `url`
    pub async fn invoke(&self, url: &str, flags: &[String]) -> Result<Invocation> {
        tracing::debug!(program = %self.program.display(), url, ?flags, "Invoking tool");

        let output = TokioCommand::new(&self.program)
            .args(&self.prefix_args)
            .arg(url)
            .args(flags)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(Error::ToolLaunch)?;

        Ok(Invocation {
            code: output.status.code().unwrap_or(1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    /// Run the tool, retrying protocol timeouts up to the configured ceiling
    pub async fn invoke_with_retries(&self, url: &str, flags: &[String]) -> Result<Invocation> {
        let mut state = Attempt::Idle.start();

        loop {
            let Attempt::Attempting(n) = state else {
                return Err(Error::Internal(format!("unexpected retry state {state:?}")));
            };

            let invocation = self.invoke(url, flags).await?;
            state = state.finish(invocation.code, &self.retry);

            match state {
                Attempt::Success => return Ok(invocation),
                Attempt::RetryableFailure(_) => {
                    state = state.retry(&self.retry);
                    if state == Attempt::FatalFailure {
                        return Err(Error::RetriesExhausted {
                            url: url.to_string(),
                            attempts: n,
                        });
                    }
                    tracing::warn!(
                        url,
                        attempt = n,
                        max_retries = self.retry.max_retries,
                        "Protocol timeout, retrying"
                    );
                }
                other => {
                    return Err(Error::Internal(format!("unexpected retry state {other:?}")));
                }
            }
        }
    }

    /// Run the tool for a smoke expectation and load everything it produced
    ///
    /// Output goes to a temporary directory that is deleted after loading,
    /// unless `debug` is set, in which case it is kept (also on a crash).
    pub async fn run_for_smoke(
        &self,
        url: &str,
        config_path: &Path,
        debug: bool,
    ) -> Result<RunResult> {
        let dir = tempfile::Builder::new().prefix("smokehouse-").tempdir()?;
        let lhr_path = dir.path().join(LHR_FILE);
        let artifacts_dir = dir.path().join(ARTIFACTS_DIR);

        let flags = vec![
            "--output=json".to_string(),
            format!("--output-path={}", lhr_path.display()),
            format!("-GA={}", artifacts_dir.display()),
            format!("--config-path={}", config_path.display()),
        ];

        let invocation = self.invoke_with_retries(url, &flags).await?;

        if debug {
            println!("  {}", "stdout:".dimmed());
            println!("{}", invocation.stdout);
            println!("  {}", "stderr:".dimmed());
            println!("{}", invocation.stderr);
        }

        // Dropping the guard deletes the directory; debug runs keep it even
        // when the tool crashed.
        let (_guard, output_dir) = if debug {
            let kept = dir.keep();
            println!(
                "  {} {}",
                "Output kept at".dimmed(),
                kept.display().to_string().dimmed()
            );
            (None, Some(kept))
        } else {
            (Some(dir), None)
        };

        if !lhr_path.exists() {
            return Err(Error::ToolCrashed {
                url: url.to_string(),
                code: invocation.code,
                stderr: invocation.stderr,
            });
        }

        let lhr = read_json(&lhr_path)?;
        let view = LhrView::from_value(&lhr)?;

        let artifacts_path = artifacts_dir.join(ARTIFACTS_FILE);
        let artifacts = if artifacts_path.exists() {
            read_json(&artifacts_path)?
        } else {
            Value::Object(serde_json::Map::new())
        };

        Ok(RunResult {
            lhr,
            view,
            artifacts,
            error_lines: normalize_stderr(&invocation.stderr),
            stderr: invocation.stderr,
            exit_code: invocation.code,
            output_dir,
        })
    }
}

/// Read and parse a JSON file
pub fn read_json(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::file_read(path, e))?;
    Ok(serde_json::from_str(&content)?)
}
