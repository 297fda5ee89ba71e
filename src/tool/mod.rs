//! External tool boundary
//!
//! Spawning the tool, retrying protocol timeouts, and narrowing its JSON
//! output into typed views.

pub mod result;
pub mod runner;

pub use result::{LhrView, RunResult, RuntimeError, Timing, TimingEntry};
pub use runner::{read_json, Attempt, Invocation, ToolRunner};
