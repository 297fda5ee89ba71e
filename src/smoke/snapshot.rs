//! Stderr snapshots
//!
//! One JSON array of normalized warn/error lines per requested URL. The file
//! name is the sanitized scheme, host and path plus a short hash of the query
//! string, so URLs that differ only in their query get separate snapshots
//! without embedding the query verbatim.

use std::path::{Path, PathBuf};

use colored::Colorize;
use sha2::{Digest, Sha256};
use url::Url;

use crate::common::paths::sanitize_component;
use crate::common::{Error, Result};

use super::expectation::Expectation;

/// Hex characters of the query hash kept in the file name
const QUERY_HASH_LEN: usize = 6;

/// Derive the snapshot name for a requested URL
pub fn snapshot_name(url: &str) -> Result<String> {
    let parsed = Url::parse(url)?;

    let mut base = format!("{}_{}", parsed.scheme(), parsed.host_str().unwrap_or_default());
    if let Some(port) = parsed.port() {
        base.push_str(&format!(":{port}"));
    }
    base.push_str(parsed.path());

    let stem = sanitize_component(&base);
    let stem = stem.trim_end_matches('_');

    let digest = hex::encode(Sha256::digest(parsed.query().unwrap_or_default().as_bytes()));

    Ok(format!("{stem}-{}", &digest[..QUERY_HASH_LEN]))
}

/// What happened to an expectation's error-line baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotOutcome {
    /// Snapshot written from this run's lines
    Updated,
    /// Existing snapshot loaded
    Loaded,
    /// No snapshot; the stderr comparison is skipped
    Missing,
}

/// Directory of stderr snapshots
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Snapshot file for a requested URL
    pub fn path_for(&self, url: &str) -> Result<PathBuf> {
        Ok(self.dir.join(format!("{}.json", snapshot_name(url)?)))
    }

    /// Load the snapshot for `url`, if one exists
    pub fn load(&self, url: &str) -> Result<Option<Vec<String>>> {
        let path = self.path_for(url)?;
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path).map_err(|e| Error::file_read(&path, e))?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Overwrite the snapshot for `url`
    pub fn save(&self, url: &str, lines: &[String]) -> Result<PathBuf> {
        let path = self.path_for(url)?;
        std::fs::create_dir_all(&self.dir)?;

        let mut content = serde_json::to_string_pretty(lines)?;
        content.push('\n');
        std::fs::write(&path, content)?;

        Ok(path)
    }
}

/// Populate an expectation's error lines from its snapshot
///
/// In update mode the snapshot is rewritten from `observed`, which then
/// becomes the baseline for this run.
pub fn apply_snapshot(
    store: &SnapshotStore,
    expectation: &mut Expectation,
    observed: &[String],
    update: bool,
) -> Result<SnapshotOutcome> {
    let url = expectation.requested_url.clone();

    if update {
        expectation.set_error_lines(observed.to_vec())?;
        let path = store.save(&url, observed)?;
        tracing::info!(url = %url, path = %path.display(), "Updated snapshot");
        return Ok(SnapshotOutcome::Updated);
    }

    match store.load(&url)? {
        Some(lines) => {
            expectation.set_error_lines(lines)?;
            Ok(SnapshotOutcome::Loaded)
        }
        None => {
            tracing::info!(url = %url, "No stderr snapshot");
            println!(
                "  {} no stderr snapshot for {}; run with -u to create one",
                "note:".yellow(),
                url
            );
            Ok(SnapshotOutcome::Missing)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_name_is_deterministic() {
        let a = snapshot_name("http://localhost:10200/preload.html?x=1").unwrap();
        let b = snapshot_name("http://localhost:10200/preload.html?x=1").unwrap();
        assert_eq!(a, b);
        assert!(a.starts_with("http_localhost_10200_preload_html-"));
        assert_eq!(a.len(), "http_localhost_10200_preload_html-".len() + 6);
    }

    #[test]
    fn test_query_changes_the_name() {
        let a = snapshot_name("https://x.test/page?a=1").unwrap();
        let b = snapshot_name("https://x.test/page?a=2").unwrap();
        let c = snapshot_name("https://x.test/page").unwrap();
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with("https_x_test_page-"));
    }

    #[test]
    fn test_query_is_not_embedded() {
        let name = snapshot_name("https://x.test/?secret=abcdef0123456789").unwrap();
        assert!(!name.contains("secret"));
        assert_eq!(name, format!("https_x_test-{}", &name[name.len() - 6..]));
    }

    #[test]
    fn test_scheme_changes_the_name() {
        let plain = snapshot_name("http://x.test/").unwrap();
        let secure = snapshot_name("https://x.test/").unwrap();
        assert_ne!(plain, secure);
        assert!(plain.starts_with("http_x_test-"));
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        assert!(matches!(snapshot_name("not a url"), Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("snapshots"));
        let lines = vec!["LH:a:warn one".to_string(), "LH:b:error two".to_string()];

        assert_eq!(store.load("https://x.test/").unwrap(), None);
        store.save("https://x.test/", &lines).unwrap();
        assert_eq!(store.load("https://x.test/").unwrap(), Some(lines));
    }

    #[test]
    fn test_update_mode_overwrites_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        store
            .save("https://x.test/", &["LH:old:warn".to_string()])
            .unwrap();

        let observed = vec!["LH:new:error".to_string()];
        let mut expectation = Expectation::new("https://x.test/");
        let outcome = apply_snapshot(&store, &mut expectation, &observed, true).unwrap();

        assert_eq!(outcome, SnapshotOutcome::Updated);
        assert_eq!(store.load("https://x.test/").unwrap(), Some(observed.clone()));
        assert_eq!(expectation.error_lines().unwrap().to_vec(), observed);
    }

    #[test]
    fn test_missing_snapshot_leaves_lines_unset() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        let mut expectation = Expectation::new("https://x.test/");

        let outcome =
            apply_snapshot(&store, &mut expectation, &["LH:a:warn".to_string()], false).unwrap();

        assert_eq!(outcome, SnapshotOutcome::Missing);
        assert!(expectation.error_lines().is_none());
        assert!(!store.path_for("https://x.test/").unwrap().exists());
    }

    #[test]
    fn test_existing_snapshot_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        store
            .save("https://x.test/", &["LH:a:warn".to_string()])
            .unwrap();

        let mut expectation = Expectation::new("https://x.test/");
        let outcome = apply_snapshot(&store, &mut expectation, &[], false).unwrap();

        assert_eq!(outcome, SnapshotOutcome::Loaded);
        assert_eq!(
            expectation.error_lines().unwrap().to_vec(),
            vec!["LH:a:warn".to_string()]
        );
    }

    #[test]
    fn test_preset_error_lines_abort() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        let mut expectation = Expectation::new("https://x.test/");
        expectation.set_error_lines(Vec::new()).unwrap();

        let err = apply_snapshot(&store, &mut expectation, &[], true).unwrap_err();
        assert!(matches!(err, Error::ErrorLinesAlreadySet(_)));
    }
}
