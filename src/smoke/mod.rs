//! Smoke test runner
//!
//! Runs the tool against each expectation, checks its result against the
//! partial expected result and its stderr against a stored snapshot, and
//! tallies the comparisons.

pub mod collate;
pub mod expectation;
pub mod normalize;
pub mod snapshot;
mod runner;

pub use collate::{Comparison, Difference, Tally};
pub use expectation::{load_expectations, Expectation};
pub use runner::{check_exit_code, print_totals, run_expectation, run_smoke, SmokeOptions};
pub use snapshot::{SnapshotOutcome, SnapshotStore};
