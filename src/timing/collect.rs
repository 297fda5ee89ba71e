//! Timing collection
//!
//! Runs the tool `runs` times per URL and keeps each JSON result in the
//! named collection directory.

use std::path::{Component, Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};

use crate::common::paths::sanitize_component;
use crate::common::{Error, Result};
use crate::tool::ToolRunner;

/// What to collect
#[derive(Debug, Clone)]
pub struct CollectOptions {
    /// Collection name; a directory under the timing data root
    pub name: String,
    pub urls: Vec<String>,
    /// Runs per URL
    pub runs: usize,
    /// Extra flags passed verbatim to every invocation
    pub tool_flags: Vec<String>,
}

/// Split a `--lh-flags` string into arguments
pub fn split_flags(flags: &str) -> Vec<String> {
    flags.split_whitespace().map(str::to_string).collect()
}

/// Directory holding the collection `name`
///
/// The name must be a single plain path component.
pub fn collection_dir(root: &Path, name: &str) -> Result<PathBuf> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(root.join(name)),
        _ => Err(Error::Config(format!(
            "Collection name '{name}' must be a plain name, not a path"
        ))),
    }
}

/// File a single run is written to
pub fn result_file_name(url: &str, index: usize) -> String {
    format!("{}-{index}.json", sanitize_component(url))
}

/// Create an empty collection directory, clearing any previous contents
pub fn prepare_collection_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        tracing::warn!(dir = %dir.display(), "Collection exists, clearing it");
        std::fs::remove_dir_all(dir)?;
    }
    std::fs::create_dir_all(dir)?;
    Ok(())
}

/// Collect `runs` results for every URL
///
/// The first failing invocation aborts the collection.
pub async fn collect(tool: &ToolRunner, root: &Path, options: &CollectOptions) -> Result<PathBuf> {
    let dir = collection_dir(root, &options.name)?;
    prepare_collection_dir(&dir)?;

    let total = (options.urls.len() * options.runs) as u64;
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .map_err(|e| Error::Internal(e.to_string()))?
            .progress_chars("=> "),
    );

    for url in &options.urls {
        for index in 0..options.runs {
            pb.set_message(url.clone());

            let output_path = dir.join(result_file_name(url, index));
            let mut flags = vec![
                "--output=json".to_string(),
                format!("--output-path={}", output_path.display()),
            ];
            flags.extend(options.tool_flags.iter().cloned());

            let invocation = tool.invoke(url, &flags).await?;
            if invocation.code != 0 || !output_path.exists() {
                pb.abandon();
                eprintln!("{}", invocation.stderr);
                return Err(Error::CollectionFailed {
                    url: url.clone(),
                    code: invocation.code,
                });
            }

            tracing::debug!(url, index, path = %output_path.display(), "Collected run");
            pb.inc(1);
        }
    }

    pb.finish_with_message("done");
    tracing::info!(dir = %dir.display(), runs = total, "Collection complete");
    Ok(dir)
}
