//! Result collation and reporting
//!
//! Expected values are partial: only the keys an expectation lists are
//! checked. A few string forms are treated as matchers instead of literals:
//!
//! - `/pattern/flags` matches the actual string against a regex (`i`, `m`, `s`)
//! - `>N`, `>=N`, `<N`, `<=N` compare the actual number against `N`
//!
//! An expected object checked against an actual array addresses elements by
//! index, plus `length`.

use colored::Colorize;
use regex::{Regex, RegexBuilder};
use serde_json::{json, Value};

use crate::tool::RunResult;

use super::expectation::Expectation;

/// Longest rendering of a JSON value in failure output
const MAX_RENDERED_LEN: usize = 200;

/// Pass/fail counts, folded across expectations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub passed: usize,
    pub failed: usize,
}

impl Tally {
    /// Count one comparison
    pub fn record(self, passed: bool) -> Self {
        if passed {
            Self {
                passed: self.passed + 1,
                ..self
            }
        } else {
            Self {
                failed: self.failed + 1,
                ..self
            }
        }
    }

    pub fn merge(self, other: Tally) -> Self {
        Self {
            passed: self.passed + other.passed,
            failed: self.failed + other.failed,
        }
    }

    /// 0 when nothing failed, 1 otherwise
    pub fn exit_code(&self) -> i32 {
        if self.failed == 0 {
            0
        } else {
            1
        }
    }
}

/// The first point where actual and expected diverge
#[derive(Debug, Clone, PartialEq)]
pub struct Difference {
    pub path: String,
    pub actual: Value,
    pub expected: Value,
}

/// One checked dimension of an expectation
#[derive(Debug, Clone)]
pub struct Comparison {
    pub name: String,
    pub actual: Value,
    pub expected: Value,
    pub diff: Option<Difference>,
}

impl Comparison {
    fn new(name: String, actual: Value, expected: Value) -> Self {
        let diff = find_difference(&name, &actual, &expected);
        Self {
            name,
            actual,
            expected,
            diff,
        }
    }

    pub fn passed(&self) -> bool {
        self.diff.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Comparator {
    Gt(f64),
    Ge(f64),
    Lt(f64),
    Le(f64),
}

impl Comparator {
    fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let number = |rest: &str| rest.trim().parse::<f64>().ok();

        if let Some(rest) = s.strip_prefix(">=") {
            number(rest).map(Comparator::Ge)
        } else if let Some(rest) = s.strip_prefix("<=") {
            number(rest).map(Comparator::Le)
        } else if let Some(rest) = s.strip_prefix('>') {
            number(rest).map(Comparator::Gt)
        } else if let Some(rest) = s.strip_prefix('<') {
            number(rest).map(Comparator::Lt)
        } else {
            None
        }
    }

    fn matches(self, actual: f64) -> bool {
        match self {
            Comparator::Gt(n) => actual > n,
            Comparator::Ge(n) => actual >= n,
            Comparator::Lt(n) => actual < n,
            Comparator::Le(n) => actual <= n,
        }
    }
}

/// Parse a `/pattern/flags` string into a regex
fn parse_pattern(s: &str) -> Option<Regex> {
    let body = s.strip_prefix('/')?;
    let end = body.rfind('/')?;
    let (pattern, flags) = (&body[..end], &body[end + 1..]);

    if pattern.is_empty() || !flags.chars().all(|c| matches!(c, 'i' | 'm' | 's')) {
        return None;
    }

    RegexBuilder::new(pattern)
        .case_insensitive(flags.contains('i'))
        .multi_line(flags.contains('m'))
        .dot_matches_new_line(flags.contains('s'))
        .build()
        .ok()
}

fn child_path(path: &str, key: &str) -> String {
    format!("{path}.{key}")
}

/// Find where `actual` stops satisfying the partial `expected` value
pub fn find_difference(path: &str, actual: &Value, expected: &Value) -> Option<Difference> {
    let mismatch = || {
        Some(Difference {
            path: path.to_string(),
            actual: actual.clone(),
            expected: expected.clone(),
        })
    };

    match expected {
        Value::String(s) => {
            if let Some(re) = parse_pattern(s) {
                return match actual {
                    Value::String(a) if re.is_match(a) => None,
                    _ => mismatch(),
                };
            }
            if let Some(cmp) = Comparator::parse(s) {
                return match actual.as_f64() {
                    Some(a) if cmp.matches(a) => None,
                    _ => mismatch(),
                };
            }
            if actual == expected {
                None
            } else {
                mismatch()
            }
        }
        Value::Number(n) => match (actual.as_f64(), n.as_f64()) {
            (Some(a), Some(e)) if a == e => None,
            _ => mismatch(),
        },
        Value::Object(map) => match actual {
            Value::Object(fields) => map.iter().find_map(|(key, exp)| {
                find_difference(
                    &child_path(path, key),
                    fields.get(key).unwrap_or(&Value::Null),
                    exp,
                )
            }),
            Value::Array(items) => map.iter().find_map(|(key, exp)| {
                let path = child_path(path, key);
                if key == "length" {
                    return find_difference(&path, &Value::from(items.len()), exp);
                }
                match key.parse::<usize>() {
                    Ok(index) => find_difference(&path, items.get(index).unwrap_or(&Value::Null), exp),
                    Err(_) => Some(Difference {
                        path,
                        actual: Value::Null,
                        expected: exp.clone(),
                    }),
                }
            }),
            _ => mismatch(),
        },
        Value::Array(expected_items) => match actual {
            Value::Array(items) if items.len() == expected_items.len() => expected_items
                .iter()
                .zip(items)
                .enumerate()
                .find_map(|(i, (exp, act))| find_difference(&child_path(path, &i.to_string()), act, exp)),
            _ => mismatch(),
        },
        Value::Null | Value::Bool(_) => {
            if actual == expected {
                None
            } else {
                mismatch()
            }
        }
    }
}

/// Compare a run against its expectation
///
/// Produces one comparison per expected result key, one per expected
/// artifact, and one for stderr when a snapshot baseline exists.
pub fn collate(expectation: &Expectation, run: &RunResult) -> Vec<Comparison> {
    let mut comparisons = Vec::new();

    for (key, expected) in expectation.expected_lhr() {
        let actual = run.lhr.get(key.as_str()).cloned().unwrap_or(Value::Null);
        comparisons.push(Comparison::new(format!("lhr.{key}"), actual, expected));
    }

    if let Some(artifacts) = &expectation.artifacts {
        for (key, expected) in artifacts {
            let actual = run.artifacts.get(key.as_str()).cloned().unwrap_or(Value::Null);
            comparisons.push(Comparison::new(
                format!("artifacts.{key}"),
                actual,
                expected.clone(),
            ));
        }
    }

    if let Some(lines) = expectation.error_lines() {
        let actual = json!(run.error_lines);
        let expected = json!(lines);
        // Compared literally; stderr lines are never matchers.
        let diff = (run.error_lines != lines).then(|| Difference {
            path: "stderr".to_string(),
            actual: actual.clone(),
            expected: expected.clone(),
        });
        comparisons.push(Comparison {
            name: "stderr".to_string(),
            actual,
            expected,
            diff,
        });
    }

    comparisons
}

fn render(value: &Value) -> String {
    let rendered = value.to_string();
    if rendered.chars().count() > MAX_RENDERED_LEN {
        let truncated: String = rendered.chars().take(MAX_RENDERED_LEN).collect();
        format!("{truncated}...")
    } else {
        rendered
    }
}

/// Print each comparison and count the results
pub fn report(comparisons: &[Comparison]) -> Tally {
    comparisons.iter().fold(Tally::default(), |tally, comparison| {
        match &comparison.diff {
            None => println!("  {} {}", "✓".green(), comparison.name.dimmed()),
            Some(diff) => {
                println!("  {} {}", "✗".red(), comparison.name);
                println!("      {} {}", "at:".dimmed(), diff.path);
                println!(
                    "      {} {}",
                    "expected:".dimmed(),
                    render(&diff.expected).green()
                );
                println!("      {} {}", "actual:".dimmed(), render(&diff.actual).red());
            }
        }
        tally.record(comparison.passed())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::LhrView;
    use pretty_assertions::assert_eq;

    fn run_result(lhr: Value, artifacts: Value, error_lines: Vec<&str>) -> RunResult {
        RunResult {
            view: LhrView::from_value(&lhr).unwrap(),
            lhr,
            artifacts,
            stderr: String::new(),
            error_lines: error_lines.into_iter().map(String::from).collect(),
            exit_code: 0,
            output_dir: None,
        }
    }

    #[test]
    fn test_partial_object_match() {
        let actual = json!({"score": 1, "details": {"items": []}, "extra": true});
        assert_eq!(find_difference("a", &actual, &json!({"score": 1})), None);
    }

    #[test]
    fn test_nested_mismatch_reports_deepest_path() {
        let actual = json!({"audits": {"viewport": {"score": 0}}});
        let expected = json!({"audits": {"viewport": {"score": 1}}});
        let diff = find_difference("lhr", &actual, &expected).unwrap();
        assert_eq!(diff.path, "lhr.audits.viewport.score");
        assert_eq!(diff.actual, json!(0));
        assert_eq!(diff.expected, json!(1));
    }

    #[test]
    fn test_integer_and_float_compare_equal() {
        assert_eq!(find_difference("n", &json!(1.0), &json!(1)), None);
    }

    #[test]
    fn test_regex_matcher() {
        assert_eq!(find_difference("ua", &json!("HeadlessChrome/90"), &json!("/chrome/i")), None);
        assert!(find_difference("ua", &json!("Firefox"), &json!("/Chrome/")).is_some());
        assert!(find_difference("ua", &json!(3), &json!("/3/")).is_some());
    }

    #[test]
    fn test_path_like_strings_are_literal() {
        assert_eq!(find_difference("p", &json!("/a/b"), &json!("/a/b")), None);
        assert!(find_difference("p", &json!("/x/b"), &json!("/a/b")).is_some());
    }

    #[test]
    fn test_numeric_comparators() {
        assert_eq!(find_difference("n", &json!(0.95), &json!(">=0.9")), None);
        assert_eq!(find_difference("n", &json!(5), &json!("<10")), None);
        assert!(find_difference("n", &json!(10), &json!("<10")).is_some());
        assert!(find_difference("n", &json!("7"), &json!(">1")).is_some());
    }

    #[test]
    fn test_arrays_match_elementwise() {
        assert_eq!(find_difference("a", &json!([1, {"x": 2, "y": 3}]), &json!([1, {"x": 2}])), None);
        let diff = find_difference("a", &json!([1, 2]), &json!([1, 2, 3])).unwrap();
        assert_eq!(diff.path, "a");
    }

    #[test]
    fn test_object_against_array_uses_indices_and_length() {
        let actual = json!(["a", "b", "c"]);
        assert_eq!(find_difference("a", &actual, &json!({"length": 3, "1": "b"})), None);
        let diff = find_difference("a", &actual, &json!({"length": ">3"})).unwrap();
        assert_eq!(diff.path, "a.length");
        assert!(find_difference("a", &actual, &json!({"first": "a"})).is_some());
    }

    #[test]
    fn test_null_matches_missing() {
        assert_eq!(find_difference("o", &json!({}), &json!({"runtimeError": null})), None);
    }

    #[test]
    fn test_requested_url_only_expectation_passes() {
        let expectation = Expectation::new("https://x.test/");
        let run = run_result(json!({"requestedUrl": "https://x.test/"}), json!({}), vec![]);

        let comparisons = collate(&expectation, &run);
        assert_eq!(comparisons.len(), 1);
        assert_eq!(report(&comparisons), Tally { passed: 1, failed: 0 });
    }

    #[test]
    fn test_stderr_skipped_without_baseline() {
        let expectation = Expectation::new("https://x.test/");
        let run = run_result(
            json!({"requestedUrl": "https://x.test/"}),
            json!({}),
            vec!["LH:a:warn unexpected"],
        );

        let comparisons = collate(&expectation, &run);
        assert!(comparisons.iter().all(|c| c.name != "stderr"));
        assert_eq!(report(&comparisons).failed, 0);
    }

    #[test]
    fn test_stderr_compared_against_baseline() {
        let mut expectation = Expectation::new("https://x.test/");
        expectation
            .set_error_lines(vec!["LH:a:warn expected".to_string()])
            .unwrap();
        let run = run_result(
            json!({"requestedUrl": "https://x.test/"}),
            json!({}),
            vec!["LH:a:warn expected", "LH:b:error surprise"],
        );

        let comparisons = collate(&expectation, &run);
        let stderr = comparisons.iter().find(|c| c.name == "stderr").unwrap();
        assert!(!stderr.passed());
        assert_eq!(report(&comparisons), Tally { passed: 1, failed: 1 });
    }

    #[test]
    fn test_artifacts_are_compared() {
        let mut expectation = Expectation::new("https://x.test/");
        let mut artifacts = serde_json::Map::new();
        artifacts.insert("HostUserAgent".into(), json!("/Chrome/"));
        artifacts.insert("Missing".into(), json!({"x": 1}));
        expectation.artifacts = Some(artifacts);

        let run = run_result(
            json!({"requestedUrl": "https://x.test/"}),
            json!({"HostUserAgent": "Mozilla/5.0 HeadlessChrome/90"}),
            vec![],
        );

        let tally = report(&collate(&expectation, &run));
        assert_eq!(tally, Tally { passed: 2, failed: 1 });
    }

    #[test]
    fn test_tally_fold_and_exit_code() {
        let tally = Tally::default()
            .merge(Tally { passed: 2, failed: 0 })
            .merge(Tally { passed: 1, failed: 0 });
        assert_eq!(tally, Tally { passed: 3, failed: 0 });
        assert_eq!(tally.exit_code(), 0);
        assert_eq!(tally.record(false).exit_code(), 1);
    }
}
