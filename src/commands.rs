//! CLI command definitions
//!
//! Defines the clap arguments for both binaries.

use clap::Parser;
use std::path::PathBuf;

use crate::timing::OutputFormat;

/// Arguments of the `smokehouse` binary
#[derive(Parser, Debug)]
#[command(name = "smokehouse", about = "Smoke-test the Lighthouse CLI against stored expectations")]
#[command(version, long_about = None)]
pub struct SmokeArgs {
    /// Lighthouse config passed to every run (smoke-dir relative or cwd relative)
    #[arg(long)]
    pub config_path: PathBuf,

    /// YAML or JSON list of expectations (smoke-dir relative or cwd relative)
    #[arg(long)]
    pub expectations_path: PathBuf,

    /// Rewrite stderr snapshots from this run
    #[arg(short = 'u', long = "update-snapshots")]
    pub update_snapshots: bool,

    /// Keep run output and print raw Lighthouse stdout/stderr
    #[arg(long)]
    pub debug: bool,
}

/// Arguments of the `compare-timings` binary
#[derive(Parser, Debug)]
#[command(name = "compare-timings", about = "Collect and summarize Lighthouse timing measurements")]
#[command(version, long_about = None)]
pub struct TimingArgs {
    /// Collection name; a directory under the timing data root, not a path
    #[arg(long)]
    pub name: String,

    /// Run Lighthouse and store the results
    #[arg(long)]
    pub collect: bool,

    /// Flags passed verbatim to every Lighthouse run
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    pub lh_flags: String,

    /// URLs to collect
    #[arg(long, num_args = 1..)]
    pub urls: Vec<String>,

    /// Runs per URL
    #[arg(short = 'n', default_value = "3")]
    pub runs: usize,

    /// Summarize the stored results
    #[arg(long)]
    pub summarize: bool,

    /// Case-insensitive regex applied to measurement names
    #[arg(long)]
    pub measure_filter: Option<String>,

    /// Summary output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,
}
