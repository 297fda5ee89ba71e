//! Stderr normalization
//!
//! Reduces the tool's log stream to the warn/error lines, minus their
//! wall-clock timestamps, so it can be compared across runs.

use std::sync::OnceLock;

use regex::Regex;

/// Matches the fixed-width `Wed, 23 Sep 2020 22:08:17 GMT ` log prefix
fn timestamp_prefix() -> &'static Regex {
    static PREFIX: OnceLock<Regex> = OnceLock::new();
    PREFIX.get_or_init(|| {
        Regex::new(r"^(?:Mon|Tue|Wed|Thu|Fri|Sat|Sun), \d{2} [A-Z][a-z]{2} \d{4} \d{2}:\d{2}:\d{2} GMT ")
            .unwrap_or_else(|e| unreachable!("timestamp pattern is valid: {e}"))
    })
}

/// Strip every leading timestamp prefix from a single line
///
/// Repeated prefixes are all removed so normalizing twice changes nothing.
pub fn strip_timestamp(mut line: &str) -> &str {
    while let Some(m) = timestamp_prefix().find(line) {
        line = &line[m.end()..];
    }
    line
}

/// Whether a log line is a warning or error
pub fn is_warn_or_error(line: &str) -> bool {
    line.contains(":warn") || line.contains(":error")
}

/// Normalize raw stderr into the ordered list of warn/error lines
pub fn normalize_stderr(raw: &str) -> Vec<String> {
    normalize_lines(raw.lines())
}

/// Normalize already-split lines
pub fn normalize_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    lines
        .into_iter()
        .map(strip_timestamp)
        .filter(|line| is_warn_or_error(line))
        .map(str::to_string)
        .collect()
}
