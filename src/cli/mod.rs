//! CLI command handling
//!
//! Resolves inputs, loads configuration and dispatches to the smoke runner
//! or the timing summarizer.

use colored::Colorize;

use crate::commands::{SmokeArgs, TimingArgs};
use crate::common::config::Config;
use crate::common::paths::resolve_input;
use crate::common::{Error, Result};
use crate::smoke::{self, SmokeOptions, SnapshotStore, Tally};
use crate::timing::{self, CollectOptions};
use crate::tool::ToolRunner;

/// Run the smoke tests described by `args`
pub async fn smoke(args: SmokeArgs) -> Result<Tally> {
    let config = Config::load()?;
    let base = &config.paths.smoke_dir;

    let config_path = resolve_input(&args.config_path, base);
    let expectations_path = resolve_input(&args.expectations_path, base);
    tracing::debug!(
        config = %config_path.display(),
        expectations = %expectations_path.display(),
        "Resolved inputs"
    );

    let expectations = smoke::load_expectations(&expectations_path)?;
    let tool = ToolRunner::from_config(&config)?;
    let store = SnapshotStore::new(config.paths.snapshot_dir());

    let options = SmokeOptions {
        config_path,
        update_snapshots: args.update_snapshots,
        debug: args.debug,
    };

    smoke::run_smoke(&tool, &store, expectations, &options).await
}

/// Collect and/or summarize timings as described by `args`
pub async fn timings(args: TimingArgs) -> Result<()> {
    if !args.collect && !args.summarize {
        return Err(Error::Config(
            "Nothing to do. Pass --collect and/or --summarize".to_string(),
        ));
    }

    let config = Config::load()?;
    let root = &config.paths.timing_data_dir;

    if args.collect {
        if args.urls.is_empty() {
            return Err(Error::Config("--collect needs at least one --urls entry".to_string()));
        }

        let tool = ToolRunner::from_config(&config)?;
        let options = CollectOptions {
            name: args.name.clone(),
            urls: args.urls.clone(),
            runs: args.runs,
            tool_flags: timing::split_flags(&args.lh_flags),
        };
        let dir = timing::collect(&tool, root, &options).await?;
        eprintln!("{} {}", "Collected into".green(), dir.display());
    }

    if args.summarize {
        let dir = timing::collection_dir(root, &args.name)?;
        let filter = timing::build_filter(args.measure_filter.as_deref())?;
        let samples = timing::load_samples(&dir, filter.as_ref())?;
        let rows = timing::summarize(&samples);
        println!("{}", timing::render(&rows, args.output)?);
    }

    Ok(())
}

/// Print a fatal error to stderr
///
/// A crashed tool also gets its own stderr echoed.
pub fn report_fatal(err: &Error) {
    if let Error::ToolCrashed { stderr, .. } = err {
        eprintln!("{}", stderr);
    }
    eprintln!("{} {}", "Error:".red().bold(), err);
}
