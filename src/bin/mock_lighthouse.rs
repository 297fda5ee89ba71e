//! Mock Lighthouse binary for integration testing
//!
//! Accepts the same positional URL and `--output-path` / `-GA` flags as the
//! real CLI. Its behavior is driven by the URL's query parameters:
//!
//! - `exit=N`: exit with code N after writing the result
//! - `runtimeError=CODE`: add a runtime error to the result
//! - `noOutput=1`: write no result at all
//! - `timeouts=K`: exit with the protocol timeout code for the first K runs,
//!   counted in the file named by `MOCK_LIGHTHOUSE_COUNTER`
//! - `warn=TEXT`: log a timestamped `LH:mock:warn TEXT` line to stderr
//! - `duration=MS`: duration of the `lh:runner:run` timing entry

use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::PathBuf;

const PROTOCOL_TIMEOUT_EXIT_CODE: i32 = 67;
const TIMESTAMP: &str = "Wed, 23 Sep 2020 22:08:17 GMT";

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let mut url = None;
    let mut output_path = None;
    let mut artifacts_dir = None;
    for arg in &args {
        if let Some(path) = arg.strip_prefix("--output-path=") {
            output_path = Some(PathBuf::from(path));
        } else if let Some(dir) = arg.strip_prefix("-GA=") {
            artifacts_dir = Some(PathBuf::from(dir));
        } else if !arg.starts_with('-') && url.is_none() {
            url = Some(arg.clone());
        }
    }

    let Some(url) = url else {
        eprintln!("{TIMESTAMP} LH:mock:error missing url");
        std::process::exit(2);
    };

    let params: HashMap<String, String> = ::url::Url::parse(&url)
        .map(|u| u.query_pairs().into_owned().collect())
        .unwrap_or_default();

    println!("mock lighthouse {url}");
    eprintln!("{TIMESTAMP} LH:status Connecting to browser");

    if let Some(limit) = params.get("timeouts").and_then(|v| v.parse::<u32>().ok()) {
        if take_timeout(limit) {
            eprintln!("{TIMESTAMP} LH:mock:error Protocol timeout");
            std::process::exit(PROTOCOL_TIMEOUT_EXIT_CODE);
        }
    }

    if let Some(text) = params.get("warn") {
        eprintln!("{TIMESTAMP} LH:mock:warn {text}");
    }

    let exit_code = params
        .get("exit")
        .and_then(|v| v.parse::<i32>().ok())
        .unwrap_or(0);

    if params.contains_key("noOutput") {
        eprintln!("{TIMESTAMP} LH:mock:error Browser crashed");
        std::process::exit(exit_code);
    }

    let duration = params
        .get("duration")
        .and_then(|v| v.parse::<f64>().ok())
        .unwrap_or(100.0);

    let mut lhr = json!({
        "requestedUrl": url,
        "finalUrl": url,
        "lighthouseVersion": "mock",
        "audits": {
            "viewport": {"id": "viewport", "score": 1},
            "errors-in-console": {"id": "errors-in-console", "score": 0, "details": {"items": []}}
        },
        "timing": {
            "total": duration,
            "entries": [
                {"name": "lh:runner:run", "duration": duration, "startTime": 0, "entryType": "measure"},
                {"name": "lh:gather:loadPage", "duration": duration / 2.0, "startTime": 1, "entryType": "measure"}
            ]
        }
    });

    if let Some(code) = params.get("runtimeError") {
        lhr["runtimeError"] = json!({"code": code, "message": format!("mock {code}")});
    }

    if let Some(path) = output_path {
        write_json(&path, &lhr);
    }

    if let Some(dir) = artifacts_dir {
        std::fs::create_dir_all(&dir).ok();
        let artifacts = json!({
            "HostUserAgent": "Mozilla/5.0 HeadlessChrome/120.0.0.0",
            "URL": {"requestedUrl": url, "finalUrl": url}
        });
        write_json(&dir.join("artifacts.json"), &artifacts);
    }

    std::process::exit(exit_code);
}

/// Consume one timeout from the shared counter; false once `limit` is reached
fn take_timeout(limit: u32) -> bool {
    let Some(counter) = std::env::var_os("MOCK_LIGHTHOUSE_COUNTER").map(PathBuf::from) else {
        return true;
    };

    let seen = std::fs::read_to_string(&counter)
        .ok()
        .and_then(|s| s.trim().parse::<u32>().ok())
        .unwrap_or(0);

    if seen >= limit {
        return false;
    }

    std::fs::write(&counter, (seen + 1).to_string()).ok();
    true
}

fn write_json(path: &std::path::Path, value: &Value) {
    let body = serde_json::to_string_pretty(value).unwrap_or_default();
    if let Err(e) = std::fs::write(path, body) {
        eprintln!("{TIMESTAMP} LH:mock:error cannot write {}: {e}", path.display());
        std::process::exit(3);
    }
}
