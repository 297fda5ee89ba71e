//! Smoke runner
//!
//! Runs every expectation in order, one tool process at a time, and folds
//! the per-expectation tallies into a total.

use std::path::PathBuf;

use colored::Colorize;

use crate::common::{Error, Result};
use crate::tool::{LhrView, ToolRunner};

use super::collate::{collate, report, Tally};
use super::expectation::Expectation;
use super::snapshot::{apply_snapshot, SnapshotStore};

/// Options for a smoke run
#[derive(Debug, Clone)]
pub struct SmokeOptions {
    /// Tool configuration passed through as `--config-path`
    pub config_path: PathBuf,
    /// Rewrite stderr snapshots from this run
    pub update_snapshots: bool,
    /// Keep output directories and print raw tool output
    pub debug: bool,
}

/// Fail unless the exit code and the result's runtime error agree
///
/// A non-zero exit must come with a runtime error and a clean exit must
/// not; anything else means the tool itself is misbehaving.
pub fn check_exit_code(url: &str, exit_code: i32, view: &LhrView) -> Result<()> {
    let runtime_error = view.runtime_error();

    if (exit_code == 0) == runtime_error.is_none() {
        return Ok(());
    }

    Err(Error::ExitCodeMismatch {
        url: url.to_string(),
        code: exit_code,
        runtime_error: runtime_error
            .map(|e| e.code.clone())
            .unwrap_or_else(|| "none".to_string()),
    })
}

/// Run a single expectation and report its comparisons
pub async fn run_expectation(
    tool: &ToolRunner,
    store: &SnapshotStore,
    mut expectation: Expectation,
    options: &SmokeOptions,
) -> Result<Tally> {
    let url = expectation.requested_url.clone();
    println!("\n{} {}", "Running:".blue().bold(), url.white().bold());

    let run = tool
        .run_for_smoke(&url, &options.config_path, options.debug)
        .await?;

    check_exit_code(&url, run.exit_code, &run.view)?;
    if let Some(err) = run.view.runtime_error() {
        println!(
            "  {} runtime error {} (exit code {})",
            "•".dimmed(),
            err.code.yellow(),
            run.exit_code
        );
    }

    apply_snapshot(
        store,
        &mut expectation,
        &run.error_lines,
        options.update_snapshots,
    )?;

    let comparisons = collate(&expectation, &run);
    Ok(report(&comparisons))
}

/// Run every expectation and return the folded tally
///
/// Any fatal error stops the batch; remaining expectations are not run.
pub async fn run_smoke(
    tool: &ToolRunner,
    store: &SnapshotStore,
    expectations: Vec<Expectation>,
    options: &SmokeOptions,
) -> Result<Tally> {
    let mut total = Tally::default();

    for expectation in expectations {
        let tally = run_expectation(tool, store, expectation, options).await?;
        total = total.merge(tally);
    }

    print_totals(&total);
    Ok(total)
}

/// Print the colored pass/fail totals
pub fn print_totals(tally: &Tally) {
    println!();
    println!(
        "{}",
        format!("{} passing", tally.passed).green().bold()
    );
    if tally.failed > 0 {
        println!("{}", format!("{} failing", tally.failed).red().bold());
    }
}
