//! Timing summaries
//!
//! Groups the timing entries of every collected result by
//! (requested URL, measurement name) and reduces each group to
//! mean / population standard deviation / min / max.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use regex::{Regex, RegexBuilder};
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::common::{Error, Result};
use crate::tool::{read_json, LhrView};

/// Duration samples keyed by (url, measurement name)
pub type Samples = BTreeMap<(String, String), Vec<f64>>;

/// How to print the summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Aggregate of one (url, measurement) group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub measure: String,
    pub url: String,
    pub n: usize,
    pub mean: f64,
    pub stdev: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Tabled)]
struct TableRow {
    measure: String,
    url: String,
    n: usize,
    mean: String,
    stdev: String,
    min: String,
    max: String,
}

impl From<&SummaryRow> for TableRow {
    fn from(row: &SummaryRow) -> Self {
        Self {
            measure: row.measure.clone(),
            url: row.url.clone(),
            n: row.n,
            mean: format!("{:.1}", row.mean),
            stdev: format!("{:.1}", row.stdev),
            min: format!("{:.1}", row.min),
            max: format!("{:.1}", row.max),
        }
    }
}

/// Compile a case-insensitive measurement filter
pub fn build_filter(pattern: Option<&str>) -> Result<Option<Regex>> {
    pattern
        .map(|p| RegexBuilder::new(p).case_insensitive(true).build())
        .transpose()
        .map_err(Error::from)
}

/// Add one result's timing entries to `samples`
///
/// Each distinct measurement name contributes one sample per result: the
/// duration of its first entry.
pub fn accumulate(
    samples: &mut Samples,
    file: &str,
    view: &LhrView,
    filter: Option<&Regex>,
) -> Result<()> {
    let url = view.requested_url.clone().ok_or_else(|| Error::FileRead {
        path: file.to_string(),
        error: "result has no requestedUrl".to_string(),
    })?;

    let entries = view.timing_entries();
    let names: BTreeSet<&str> = entries
        .iter()
        .map(|e| e.name.as_str())
        .filter(|name| filter.map_or(true, |re| re.is_match(name)))
        .collect();

    for name in names {
        let entry = entries
            .iter()
            .find(|e| e.name == name)
            .ok_or_else(|| Error::MeasurementMissing {
                name: name.to_string(),
                file: file.to_string(),
            })?;

        samples
            .entry((url.clone(), name.to_string()))
            .or_default()
            .push(entry.duration);
    }

    Ok(())
}

/// Result files of a collection, in a stable order
fn result_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| Error::file_read(dir, e))? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Read every result in a collection directory into samples
pub fn load_samples(dir: &Path, filter: Option<&Regex>) -> Result<Samples> {
    let mut samples = Samples::new();

    for path in result_files(dir)? {
        let lhr = read_json(&path)?;
        let view = LhrView::from_value(&lhr)?;
        accumulate(&mut samples, &path.display().to_string(), &view, filter)?;
    }

    tracing::debug!(dir = %dir.display(), groups = samples.len(), "Loaded timing samples");
    Ok(samples)
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Reduce one group of samples; `None` for an empty group
pub fn summarize_group(measure: &str, url: &str, durations: &[f64]) -> Option<SummaryRow> {
    if durations.is_empty() {
        return None;
    }

    let n = durations.len();
    let mean = durations.iter().sum::<f64>() / n as f64;
    let variance = durations
        .iter()
        .map(|d| {
            let delta = d - mean;
            delta * delta
        })
        .sum::<f64>()
        / n as f64;
    let min = durations.iter().copied().fold(f64::INFINITY, f64::min);
    let max = durations.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    Some(SummaryRow {
        measure: measure.to_string(),
        url: url.to_string(),
        n,
        mean: round1(mean),
        stdev: round1(variance.sqrt()),
        min: round1(min),
        max: round1(max),
    })
}

/// Case-folded comparison with a raw tiebreak, so the order stays total
fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Order rows by measurement name, then URL
pub fn compare_rows(a: &SummaryRow, b: &SummaryRow) -> Ordering {
    compare_text(&a.measure, &b.measure).then_with(|| compare_text(&a.url, &b.url))
}

/// Summarize every group, sorted
pub fn summarize(samples: &Samples) -> Vec<SummaryRow> {
    let mut rows: Vec<SummaryRow> = samples
        .iter()
        .filter_map(|((url, measure), durations)| summarize_group(measure, url, durations))
        .collect();
    rows.sort_by(compare_rows);
    rows
}

/// Render rows as a table or JSON
pub fn render(rows: &[SummaryRow], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(rows)?),
        OutputFormat::Table => {
            let table_rows: Vec<TableRow> = rows.iter().map(TableRow::from).collect();
            let mut table = Table::new(&table_rows);
            table.with(Style::modern());
            Ok(table.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn lhr(url: &str, entries: &[(&str, f64)]) -> serde_json::Value {
        let entries: Vec<_> = entries
            .iter()
            .map(|(name, duration)| json!({"name": name, "duration": duration, "startTime": 0}))
            .collect();
        json!({"requestedUrl": url, "timing": {"entries": entries}})
    }

    fn write_collection(dir: &Path) {
        let runs = [
            lhr("https://b.test/", &[("script-evaluation", 100.0), ("lh:runner:run", 1000.0)]),
            lhr("https://b.test/", &[("script-evaluation", 200.0), ("lh:runner:run", 1100.0)]),
            lhr("https://b.test/", &[("script-evaluation", 300.0), ("lh:runner:run", 1200.0)]),
            lhr("https://a.test/", &[("Script-Evaluation", 50.0)]),
        ];
        for (i, run) in runs.iter().enumerate() {
            std::fs::write(dir.join(format!("run-{i}.json")), run.to_string()).unwrap();
        }
        std::fs::write(dir.join("notes.txt"), "ignored").unwrap();
    }

    #[test]
    fn test_summary_statistics() {
        let row = summarize_group("script-evaluation", "u", &[100.0, 200.0, 300.0]).unwrap();
        assert_eq!(row.n, 3);
        assert_eq!(row.mean, 200.0);
        assert_eq!(row.stdev, 81.6);
        assert_eq!(row.min, 100.0);
        assert_eq!(row.max, 300.0);
    }

    #[test]
    fn test_single_sample_has_zero_stdev() {
        let row = summarize_group("m", "u", &[12.34]).unwrap();
        assert_eq!(row.mean, 12.3);
        assert_eq!(row.stdev, 0.0);
        assert_eq!(row.min, 12.3);
    }

    #[test]
    fn test_empty_group_is_skipped() {
        assert!(summarize_group("m", "u", &[]).is_none());
    }

    #[test]
    fn test_load_and_summarize_collection() {
        let dir = tempfile::tempdir().unwrap();
        write_collection(dir.path());

        let samples = load_samples(dir.path(), None).unwrap();
        let rows = summarize(&samples);

        let keys: Vec<(&str, &str)> = rows
            .iter()
            .map(|r| (r.measure.as_str(), r.url.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("lh:runner:run", "https://b.test/"),
                ("Script-Evaluation", "https://a.test/"),
                ("script-evaluation", "https://b.test/"),
            ]
        );
        assert_eq!(rows[2].n, 3);
        assert_eq!(rows[2].mean, 200.0);
        assert_eq!(rows[0].stdev, 81.6);
    }

    #[test]
    fn test_filter_is_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        write_collection(dir.path());

        let filter = build_filter(Some("SCRIPT")).unwrap();
        let samples = load_samples(dir.path(), filter.as_ref()).unwrap();

        assert_eq!(samples.len(), 2);
        assert!(samples.keys().all(|(_, name)| name.to_lowercase() == "script-evaluation"));
    }

    #[test]
    fn test_invalid_filter() {
        assert!(matches!(build_filter(Some("(")), Err(Error::InvalidFilter(_))));
        assert!(build_filter(None).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_entries_count_once_per_result() {
        let view = LhrView::from_value(&lhr("u", &[("m", 1.0), ("m", 99.0)])).unwrap();
        let mut samples = Samples::new();
        accumulate(&mut samples, "f.json", &view, None).unwrap();
        assert_eq!(samples[&("u".to_string(), "m".to_string())], vec![1.0]);
    }

    #[test]
    fn test_result_without_url_is_rejected() {
        let view = LhrView::from_value(&json!({"timing": {"entries": []}})).unwrap();
        let err = accumulate(&mut Samples::new(), "f.json", &view, None).unwrap_err();
        assert!(err.to_string().contains("f.json"));
    }

    #[test]
    fn test_sort_order_is_stable() {
        let dir = tempfile::tempdir().unwrap();
        write_collection(dir.path());
        let samples = load_samples(dir.path(), None).unwrap();

        let first = summarize(&samples);
        let mut reversed = first.clone();
        reversed.reverse();
        reversed.sort_by(compare_rows);
        assert_eq!(first, reversed);
    }

    #[test]
    fn test_render_json() {
        let rows = vec![summarize_group("m", "u", &[1.0, 3.0]).unwrap()];
        let rendered: serde_json::Value =
            serde_json::from_str(&render(&rows, OutputFormat::Json).unwrap()).unwrap();
        assert_eq!(
            rendered,
            json!([{"measure": "m", "url": "u", "n": 2, "mean": 2.0, "stdev": 1.0, "min": 1.0, "max": 3.0}])
        );
    }

    #[test]
    fn test_render_table() {
        let rows = vec![summarize_group("script-evaluation", "https://x.test/", &[100.0, 200.0, 300.0]).unwrap()];
        let table = render(&rows, OutputFormat::Table).unwrap();
        assert!(table.contains("script-evaluation"));
        assert!(table.contains("81.6"));
        assert!(table.contains("stdev"));
    }
}
